//! Spinner shown while discovery talks to the network.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// A spinner ticking on its own background thread.
///
/// Dropping it stops the ticker and clears the line without waiting for
/// the thread. On a non-terminal stdout the spinner stays hidden.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn start(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            bar.set_style(style.tick_chars("-\\|/ "));
        }
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Prints a line above the spinner.
    pub fn println(&self, line: &str) {
        self.bar.suspend(|| println!("{}", line));
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}
