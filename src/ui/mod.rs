pub mod board;
pub mod icons;
pub mod progress;

pub use board::{render_board, render_detail, render_projects};
pub use progress::SyncUI;
