use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui::icons::{CHECK, CROSS};

/// Spinner shown while the board waits for the task API.
///
/// Draws to stderr and hides itself when stderr is not a terminal, so
/// piped output stays clean.
pub struct SyncUI {
    bar: ProgressBar,
}

impl SyncUI {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg} {elapsed:.dim}")
                .expect("progress bar template is a valid static string"),
        );
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish_ok(&self, message: impl AsRef<str>) {
        self.bar
            .finish_with_message(format!("{}{}", CHECK, style(message.as_ref()).green()));
    }

    pub fn finish_err(&self, message: impl AsRef<str>) {
        self.bar
            .finish_with_message(format!("{}{}", CROSS, style(message.as_ref()).red()));
    }

    /// Remove the spinner without leaving a line behind.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}
