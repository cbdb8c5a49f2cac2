//! Terminal prompts backed by `inquire`.

use docgrab_core::{MenuChoice, Prompter};
use docgrab_shared::{DocgrabError, Result};
use indicatif::ProgressBar;
use inquire::{InquireError, Select, Text};

/// Interactive prompter. Hides the progress spinner while a prompt is open.
pub(crate) struct InquirePrompter {
    spinner: ProgressBar,
}

impl InquirePrompter {
    pub(crate) fn new(spinner: ProgressBar) -> Self {
        Self { spinner }
    }

    fn text(&self, message: &str) -> Result<String> {
        match self.spinner.suspend(|| Text::new(message).prompt()) {
            Ok(answer) => Ok(answer),
            // Esc answers with nothing, which the controller re-prompts on
            Err(InquireError::OperationCanceled) => Ok(String::new()),
            Err(e) => Err(prompt_error(e)),
        }
    }
}

impl Prompter for InquirePrompter {
    fn choose(&mut self, choices: &[MenuChoice]) -> Result<MenuChoice> {
        let answer = self
            .spinner
            .suspend(|| Select::new("What should be downloaded?", choices.to_vec()).prompt());
        match answer {
            Ok(choice) => Ok(choice),
            Err(InquireError::OperationCanceled) => Ok(MenuChoice::Skip),
            Err(e) => Err(prompt_error(e)),
        }
    }

    fn ask_indices(&mut self, count: usize) -> Result<String> {
        self.text(&format!("Pages to fetch, 1-{count} (e.g. 1,3,10-20):"))
    }

    fn ask_pattern(&mut self) -> Result<String> {
        self.text("Regex matched against page URLs:")
    }

    fn notify(&mut self, message: &str) {
        self.spinner.suspend(|| println!("{message}"));
    }
}

/// Ask for the next documentation URL. `None` on an empty line or end of input.
pub(crate) fn next_url() -> Result<Option<String>> {
    match Text::new("Documentation URL (empty to finish):").prompt() {
        Ok(answer) if answer.trim().is_empty() => Ok(None),
        Ok(answer) => Ok(Some(answer)),
        Err(InquireError::OperationCanceled | InquireError::NotTTY) => Ok(None),
        Err(e) => Err(prompt_error(e)),
    }
}

fn prompt_error(e: InquireError) -> DocgrabError {
    DocgrabError::Prompt(e.to_string())
}
