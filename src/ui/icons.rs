//! Shared UI icons.
//!
//! Each icon falls back to plain ASCII on terminals without emoji support.

use console::Emoji;

// Outcome indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Board indicators
pub static COLUMN: Emoji<'_, '_> = Emoji("📋 ", "#");
pub static CARD: Emoji<'_, '_> = Emoji("▪ ", "-");
pub static PERSON: Emoji<'_, '_> = Emoji("👤 ", "@");
pub static MOVE: Emoji<'_, '_> = Emoji("➡️  ", "->");

// Detail indicators
pub static COMMENT: Emoji<'_, '_> = Emoji("💬 ", ">");
pub static ATTACHMENT: Emoji<'_, '_> = Emoji("📎 ", "+");
pub static TAG: Emoji<'_, '_> = Emoji("🏷️  ", "~");
