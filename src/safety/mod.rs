//! Confirmation gate in front of a deletion batch.
//!
//! - Dry-run: no prompt and no delete request is ever sent.
//! - Force: no prompt.
//! - Otherwise the operator must type exactly `yes`.
//!
//! A prompt cannot be answered without a terminal, and would corrupt JSON
//! log output, so in those environments deletion requires `--force`. Without
//! it the gate fails with `InputUnavailable` (exit 1), which is not the same
//! as an operator declining (`Cancelled`, exit 0).

use std::io::{BufRead, IsTerminal, Write};

use anyhow::{Result, anyhow};
use tracing::info;

use crate::config::Config;
use crate::types::error::S3cleanerError;

const CONFIRMATION_WORD: &str = "yes";

/// Reads the operator's answer. Swapped out in tests.
pub trait PromptHandler: Send + Sync {
    /// Shows the prompt and returns one trimmed line of input.
    fn read_confirmation(&self) -> Result<String>;

    /// `true` when stdin and stdout are both terminals.
    fn is_interactive(&self) -> bool;
}

pub struct StdioPromptHandler;

impl PromptHandler for StdioPromptHandler {
    fn read_confirmation(&self) -> Result<String> {
        print!("Type '{CONFIRMATION_WORD}' to confirm deletion: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
    }
}

/// What the caller may do after the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    /// Send the delete requests.
    Delete,
    /// Report the plan only.
    DryRun,
}

pub struct SafetyChecker {
    dry_run: bool,
    force: bool,
    json_logging: bool,
    prompt_handler: Box<dyn PromptHandler>,
}

impl SafetyChecker {
    pub fn new(config: &Config) -> Self {
        Self::with_prompt_handler(config, Box::new(StdioPromptHandler))
    }

    pub fn with_prompt_handler(config: &Config, prompt_handler: Box<dyn PromptHandler>) -> Self {
        let json_logging = config
            .tracing_config
            .map(|tc| tc.json_tracing)
            .unwrap_or(false);

        Self {
            dry_run: config.dry_run,
            force: config.force,
            json_logging,
            prompt_handler,
        }
    }

    /// Decides whether the planned deletion may run.
    ///
    /// Returns `Err(S3cleanerError::Cancelled)` when the operator answers
    /// anything but `yes`, and `Err(S3cleanerError::InputUnavailable)` when no
    /// prompt can be shown and `--force` was not given.
    pub fn check_before_deletion(&self) -> Result<Approval> {
        if self.dry_run {
            info!("dry-run mode: no object will be deleted.");
            return Ok(Approval::DryRun);
        }

        if self.force {
            return Ok(Approval::Delete);
        }

        if self.json_logging || !self.prompt_handler.is_interactive() {
            let reason = if self.json_logging {
                "confirmation prompt is disabled with JSON logging; pass --force to delete"
            } else {
                "confirmation requires an interactive terminal; pass --force to delete"
            };
            return Err(anyhow!(S3cleanerError::InputUnavailable(
                reason.to_string()
            )));
        }

        let input = self.prompt_handler.read_confirmation()?;
        if input != CONFIRMATION_WORD {
            info!("deletion declined by user.");
            return Err(anyhow!(S3cleanerError::Cancelled));
        }

        Ok(Approval::Delete)
    }
}
