use dialoguer::{Input, theme::ColorfulTheme};
use std::io;

/// Abstraction over a boolean (yes/no) confirmation prompt.
///
/// This trait allows interactive confirmation to be injected or mocked,
/// promoting testability in CLI workflows.
pub trait ConfirmPrompter {
    /// Prompt the user for a yes/no confirmation.
    ///
    /// # Returns
    /// `Ok(true)` if confirmed, `Ok(false)` if declined, or `Err(String)` on input failure.
    fn confirm(&mut self, prompt: &str) -> Result<bool, String>;
}

/// Default implementation of `ConfirmPrompter` using `dialoguer::Input`.
///
/// Reads a whole line, accepts `y`/`yes` and `n`/`no` in any case, and asks
/// again on anything else. End of input counts as a decline.
pub struct DialoguerConfirmPrompter;

impl ConfirmPrompter for DialoguerConfirmPrompter {
    fn confirm(&mut self, prompt: &str) -> Result<bool, String> {
        let theme = ColorfulTheme::default();
        let input = Input::<String>::with_theme(&theme)
            .with_prompt(format!("{} (y/n)", prompt))
            .validate_with(|line: &String| validate_answer(line));
        match input.interact_text() {
            Ok(line) => Ok(parse_answer(&line).unwrap_or(false)),
            Err(dialoguer::Error::IO(e)) if declines(&e) => Ok(false),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Interprets one line of operator input.
fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn validate_answer(line: &str) -> Result<(), &'static str> {
    parse_answer(line)
        .map(|_| ())
        .ok_or("Please enter 'y' or 'n'")
}

/// Closed input or Ctrl-C at the prompt.
fn declines(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted
    )
}

/// Ask the operator to confirm rewriting and force pushing every listed repository.
pub fn confirm_rewrite<P: ConfirmPrompter>(prompter: &mut P) -> Result<bool, String> {
    prompter.confirm("Are you sure?")
}
