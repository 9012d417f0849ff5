//! Optional voice input.
//!
//! Capture is delegated to an external recognizer command that prints the
//! transcript on stdout. When none is configured the capability is reported
//! as unsupported and the voice command stays disabled.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{ClientError, Result};

#[async_trait]
pub trait SpeechInput: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Record one utterance. `None` means nothing was recognized.
    async fn capture(&self) -> Result<Option<String>>;
}

/// No recognizer available.
pub struct Unsupported;

#[async_trait]
impl SpeechInput for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    async fn capture(&self) -> Result<Option<String>> {
        Err(ClientError::Speech(
            "voice input is not supported in this environment".to_string(),
        ))
    }
}

/// Runs a recognizer program and reads the transcript from its stdout.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a shell-style command line on whitespace. Returns `None` for a
    /// blank line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl SpeechInput for CommandSpeech {
    fn is_supported(&self) -> bool {
        true
    }

    async fn capture(&self) -> Result<Option<String>> {
        tracing::debug!(program = %self.program, "Capturing voice input");

        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ClientError::Speech(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Speech(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!transcript.is_empty()).then_some(transcript))
    }
}

/// Pick the recognizer from an optional command line.
pub fn from_command(command_line: Option<&str>) -> Box<dyn SpeechInput> {
    match command_line.and_then(CommandSpeech::parse) {
        Some(speech) => Box::new(speech),
        None => Box::new(Unsupported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_reports_and_refuses() {
        let speech = Unsupported;
        assert!(!speech.is_supported());
        assert!(matches!(speech.capture().await, Err(ClientError::Speech(_))));
    }

    #[test]
    fn test_parse_splits_program_and_args() {
        let speech = CommandSpeech::parse("  whisper-cli --lang en ").unwrap();
        assert_eq!(speech.program, "whisper-cli");
        assert_eq!(speech.args, vec!["--lang", "en"]);
        assert!(CommandSpeech::parse("   ").is_none());
    }

    #[test]
    fn test_from_command_selects_capability() {
        assert!(!from_command(None).is_supported());
        assert!(!from_command(Some("")).is_supported());
        assert!(from_command(Some("echo hi")).is_supported());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_transcript_is_trimmed_stdout() {
        let speech = CommandSpeech::new("echo", vec!["  I have a headache ".to_string()]);
        let transcript = speech.capture().await.unwrap();
        assert_eq!(transcript.as_deref(), Some("I have a headache"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_command_yields_nothing() {
        let speech = CommandSpeech::new("true", Vec::new());
        assert_eq!(speech.capture().await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_an_error() {
        let speech = CommandSpeech::new("false", Vec::new());
        assert!(matches!(speech.capture().await, Err(ClientError::Speech(_))));
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let speech = CommandSpeech::new("vitabot-no-such-recognizer", Vec::new());
        assert!(matches!(speech.capture().await, Err(ClientError::Speech(_))));
    }
}
