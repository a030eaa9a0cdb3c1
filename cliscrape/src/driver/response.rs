//! Response type for command execution results.

use std::time::Duration;

/// Response from executing a single command or a fallback list.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command whose output this is.
    pub command: String,

    /// Label of the candidate that produced this response, if any.
    pub label: Option<String>,

    /// The command output, verbatim from the session.
    pub result: String,

    /// Time taken across all attempts.
    pub elapsed: Duration,

    /// Number of commands sent to produce this response.
    pub attempts: usize,

    /// Why the device rejected the command, if it did.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a new accepted response.
    pub fn new(command: impl Into<String>, result: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            command: command.into(),
            label: None,
            result: result.into(),
            elapsed,
            attempts: 1,
            failure_message: None,
        }
    }

    /// Create a rejected response.
    pub fn rejected(
        command: impl Into<String>,
        result: impl Into<String>,
        elapsed: Duration,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            failure_message: Some(failure_message.into()),
            ..Self::new(command, result, elapsed)
        }
    }

    /// Check if the device accepted the command.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Take the output text.
    pub fn into_result(self) -> String {
        self.result
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
