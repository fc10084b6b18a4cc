//! Interactive prompts used to discover an existing installation.

use dialoguer::{Confirm, Input};
use std::io::IsTerminal;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error(
        "cannot prompt in a non-interactive session; set skipExistingDaprCheck, or both \
         existingDaprReleaseName and existingDaprReleaseNamespace, in the configuration settings"
    )]
    NotInteractive,

    #[error("prompt failed: {0}")]
    Terminal(#[from] dialoguer::Error),
}

/// Yes/no and free-text questions to the operator.
pub trait Prompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError>;

    /// Free-text answer; may be empty.
    fn text(&self, message: &str, help: Option<&str>) -> Result<String, PromptError>;
}

impl<P: Prompt + ?Sized> Prompt for &P {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        (**self).confirm(message, default)
    }
    fn text(&self, message: &str, help: Option<&str>) -> Result<String, PromptError> {
        (**self).text(message, help)
    }
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn ensure_tty() -> Result<(), PromptError> {
        if std::io::stdin().is_terminal() {
            Ok(())
        } else {
            Err(PromptError::NotInteractive)
        }
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        Self::ensure_tty()?;
        Ok(Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()?)
    }

    fn text(&self, message: &str, help: Option<&str>) -> Result<String, PromptError> {
        Self::ensure_tty()?;
        let prompt = match help {
            Some(help) => format!("{} ({})", message, help),
            None => message.to_string(),
        };
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer.trim().to_string())
    }
}
