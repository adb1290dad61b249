//! Speech output through an external synthesizer program

use std::process::{Command, Stdio};

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Renders text as audible speech
pub trait SpeechSink {
    /// Speak `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if the synthesizer cannot be started at all
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Runs `<command> <args..> <text>` and waits for it to exit
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    command: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// Create a speaker from speech configuration
    #[must_use]
    pub fn new(config: &SpeechConfig) -> Self {
        tracing::debug!(command = %config.command, args = ?config.args, "speech synthesizer configured");
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }

    /// Synthesizer program name
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl SpeechSink for CommandSpeaker {
    fn speak(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        tracing::debug!(command = %self.command, chars = text.len(), "speaking");

        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(as_operand(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| Error::Tts(format!("failed to run {}: {e}", self.command)))?;

        if !status.success() {
            tracing::warn!(command = %self.command, %status, "synthesizer reported failure");
        }

        Ok(())
    }
}

/// Keep text that starts with `-` from being parsed as an option
fn as_operand(text: &str) -> String {
    if text.starts_with('-') {
        format!(" {text}")
    } else {
        text.to_string()
    }
}
