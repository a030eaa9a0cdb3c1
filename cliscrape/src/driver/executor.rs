//! Command execution with fallback candidates.
//!
//! Firmware revisions of the same switch family do not always agree on
//! command syntax. A [`Commands::Fallback`] list is tried in order until the
//! device accepts one; what counts as "rejected" is decided by a
//! [`RejectionCheck`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use memchr::memmem;

use super::response::Response;
use crate::error::{DriverError, Result};
use crate::transport::Session;

/// Decides whether a response means the device rejected the command.
pub trait RejectionCheck: Send + Sync {
    /// Return the reason when `output` is a rejection.
    fn rejection(&self, output: &str) -> Option<String>;
}

/// Rejects output containing a fixed marker, such as `% Invalid`.
#[derive(Clone)]
pub struct MarkerRejection {
    marker: String,
    finder: memmem::Finder<'static>,
}

impl MarkerRejection {
    pub fn new(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        let finder = memmem::Finder::new(marker.as_bytes()).into_owned();
        Self { marker, finder }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl fmt::Debug for MarkerRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerRejection")
            .field("marker", &self.marker)
            .finish()
    }
}

impl RejectionCheck for MarkerRejection {
    fn rejection(&self, output: &str) -> Option<String> {
        if self.marker.is_empty() {
            return None;
        }
        self.finder
            .find(output.as_bytes())
            .map(|_| format!("output contains '{}'", self.marker))
    }
}

impl<F> RejectionCheck for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn rejection(&self, output: &str) -> Option<String> {
        self(output).then(|| "rejected by predicate".to_string())
    }
}

/// One entry in a fallback list.
#[derive(Clone)]
pub struct CommandCandidate {
    /// The command to send.
    pub command: String,

    /// Tag shown in logs and carried into the response.
    pub label: Option<String>,

    /// Overrides the executor's default rejection check.
    pub check: Option<Arc<dyn RejectionCheck>>,
}

impl CommandCandidate {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            label: None,
            check: None,
        }
    }

    /// Tag this candidate.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Use a specific rejection check for this candidate.
    pub fn with_check(mut self, check: impl RejectionCheck + 'static) -> Self {
        self.check = Some(Arc::new(check));
        self
    }
}

impl fmt::Debug for CommandCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandCandidate")
            .field("command", &self.command)
            .field("label", &self.label)
            .field("check", &self.check.as_ref().map(|_| "<RejectionCheck>"))
            .finish()
    }
}

impl From<&str> for CommandCandidate {
    fn from(command: &str) -> Self {
        Self::new(command)
    }
}

impl From<String> for CommandCandidate {
    fn from(command: String) -> Self {
        Self::new(command)
    }
}

/// A single command or an ordered list of candidates.
#[derive(Debug, Clone)]
pub enum Commands {
    /// Send once and return the output as is.
    Single(String),

    /// Try each candidate until the device accepts one.
    Fallback(Vec<CommandCandidate>),
}

impl Commands {
    pub fn single(command: impl Into<String>) -> Self {
        Commands::Single(command.into())
    }

    pub fn fallback<I>(candidates: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CommandCandidate>,
    {
        Commands::Fallback(candidates.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Commands {
    fn from(command: &str) -> Self {
        Commands::single(command)
    }
}

impl From<String> for Commands {
    fn from(command: String) -> Self {
        Commands::Single(command)
    }
}

impl From<Vec<CommandCandidate>> for Commands {
    fn from(candidates: Vec<CommandCandidate>) -> Self {
        Commands::Fallback(candidates)
    }
}

impl<const N: usize> From<[&str; N]> for Commands {
    fn from(candidates: [&str; N]) -> Self {
        Commands::fallback(candidates)
    }
}

/// Sends [`Commands`] over a session.
#[derive(Clone)]
pub struct CommandExecutor {
    default_check: Arc<dyn RejectionCheck>,
}

impl CommandExecutor {
    /// Executor rejecting output that contains `marker`.
    pub fn new(marker: impl Into<String>) -> Self {
        Self::with_check(MarkerRejection::new(marker))
    }

    /// Executor with a custom default rejection check.
    pub fn with_check(check: impl RejectionCheck + 'static) -> Self {
        Self {
            default_check: Arc::new(check),
        }
    }

    /// Execute `commands` over `session`.
    ///
    /// A single command's output is returned verbatim. For a fallback list
    /// the first accepted response wins; when every candidate is rejected
    /// the last response is returned with `failure_message` set, so callers
    /// must check [`Response::is_success`] themselves.
    pub async fn execute<S: Session>(&self, session: &mut S, commands: &Commands) -> Result<Response> {
        match commands {
            Commands::Single(command) => {
                let start = Instant::now();
                let output = session.send_command(command).await?;
                let elapsed = start.elapsed();
                Ok(match self.default_check.rejection(&output) {
                    Some(reason) => Response::rejected(command, output, elapsed, reason),
                    None => Response::new(command, output, elapsed),
                })
            }
            Commands::Fallback(candidates) => self.execute_fallback(session, candidates).await,
        }
    }

    async fn execute_fallback<S: Session>(
        &self,
        session: &mut S,
        candidates: &[CommandCandidate],
    ) -> Result<Response> {
        if candidates.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: "fallback command list is empty".to_string(),
            }
            .into());
        }

        let start = Instant::now();
        let mut last = None;

        for (attempt, candidate) in candidates.iter().enumerate() {
            let output = session.send_command(&candidate.command).await?;
            let check = candidate.check.as_ref().unwrap_or(&self.default_check);

            let mut response = match check.rejection(&output) {
                Some(reason) => {
                    debug!(
                        "Candidate '{}'{} rejected: {}",
                        candidate.command,
                        candidate
                            .label
                            .as_deref()
                            .map(|l| format!(" [{}]", l))
                            .unwrap_or_default(),
                        reason
                    );
                    Response::rejected(&candidate.command, output, start.elapsed(), reason)
                }
                None => Response::new(&candidate.command, output, start.elapsed()),
            };
            response.label = candidate.label.clone();
            response.attempts = attempt + 1;

            if response.is_success() {
                return Ok(response);
            }
            last = Some(response);
        }

        // Every candidate was rejected; hand back the last attempt.
        last.ok_or_else(|| {
            DriverError::InvalidConfig {
                message: "fallback command list is empty".to_string(),
            }
            .into()
        })
    }
}

impl fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandExecutor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{INVALID_BANNER, MockConnector};

    fn executor() -> CommandExecutor {
        CommandExecutor::new("% Invalid")
    }

    #[tokio::test]
    async fn test_fallback_skips_rejected_candidate() {
        let mock = MockConnector::new().reply("cmdB", "output of B");
        let mut session = mock.session();

        let response = executor()
            .execute(&mut session, &Commands::from(["cmdA", "cmdB"]))
            .await
            .unwrap();

        assert_eq!(response.result, "output of B");
        assert_eq!(response.command, "cmdB");
        assert_eq!(response.attempts, 2);
        assert!(response.is_success());
        assert_eq!(mock.sent(), vec!["cmdA", "cmdB"]);
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_accepted() {
        let mock = MockConnector::new()
            .reply("cmdA", "output of A")
            .reply("cmdB", "output of B");
        let mut session = mock.session();

        let response = executor()
            .execute(&mut session, &Commands::from(["cmdA", "cmdB"]))
            .await
            .unwrap();

        assert_eq!(response.result, "output of A");
        assert_eq!(mock.sent(), vec!["cmdA"]);
    }

    #[tokio::test]
    async fn test_all_rejected_returns_last_response() {
        let mock = MockConnector::new();
        let mut session = mock.session();

        let response = executor()
            .execute(&mut session, &Commands::from(["cmdA", "cmdB"]))
            .await
            .unwrap();

        assert_eq!(response.command, "cmdB");
        assert!(response.result.contains("% Invalid"));
        assert!(!response.is_success());
        assert_eq!(response.attempts, 2);
    }

    #[tokio::test]
    async fn test_single_command_returned_verbatim() {
        let mock = MockConnector::new();
        let mut session = mock.session();

        let response = executor()
            .execute(&mut session, &Commands::single("show bogus"))
            .await
            .unwrap();

        assert_eq!(response.result, format!("show bogus{}", INVALID_BANNER));
        assert!(response.failure_message.is_some());
        assert_eq!(mock.sent(), vec!["show bogus"]);
    }

    #[tokio::test]
    async fn test_candidate_check_overrides_default() {
        let mock = MockConnector::new()
            .reply("show system unit 1 id", "Error: unit not present")
            .reply("show system id", "Serial number : PSZ20161234");
        let mut session = mock.session();

        let commands = Commands::Fallback(vec![
            CommandCandidate::new("show system unit 1 id")
                .labeled("stack")
                .with_check(|out: &str| out.starts_with("Error:")),
            CommandCandidate::new("show system id").labeled("standalone"),
        ]);

        let response = executor().execute(&mut session, &commands).await.unwrap();
        assert_eq!(response.label.as_deref(), Some("standalone"));
        assert_eq!(response.result, "Serial number : PSZ20161234");
    }

    #[tokio::test]
    async fn test_empty_fallback_is_an_error() {
        let mock = MockConnector::new();
        let mut session = mock.session();

        let result = executor()
            .execute(&mut session, &Commands::Fallback(vec![]))
            .await;
        assert!(result.is_err());
        assert!(mock.sent().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_not_swallowed() {
        let mock = MockConnector::new().fail_on("cmdA").reply("cmdB", "ok");
        let mut session = mock.session();

        let result = executor()
            .execute(&mut session, &Commands::from(["cmdA", "cmdB"]))
            .await;
        assert!(matches!(
            result,
            Err(crate::Error::Transport(crate::error::TransportError::Disconnected))
        ));
        assert_eq!(mock.sent(), vec!["cmdA"]);
    }

    #[test]
    fn test_single_command_accepted() {
        let mock = MockConnector::new().reply("show version", "SW version    1.4.5.02");
        let mut session = mock.session();

        let response = tokio_test::block_on(
            executor().execute(&mut session, &Commands::single("show version")),
        );
        let response = tokio_test::assert_ok!(response);
        assert!(response.is_success());
        assert_eq!(response.attempts, 1);
        assert_eq!(response.label, None);
    }

    #[test]
    fn test_marker_rejection() {
        let check = MarkerRejection::new("% Invalid");
        assert!(check.rejection("% Invalid input detected").is_some());
        assert!(check.rejection("System Name: switch1").is_none());
        assert!(MarkerRejection::new("").rejection("% Invalid").is_none());
    }
}
