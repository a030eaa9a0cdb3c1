//! Scripted session for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{ConnectionParameters, Connector, Session};
use crate::error::{Result, TransportError};

/// What happened on a mock session, shared with the test body.
#[derive(Debug, Default)]
pub(crate) struct MockLog {
    pub connects: usize,
    pub enables: usize,
    pub disconnects: usize,
    pub sent: Vec<String>,
}

/// Replies to commands from a fixed table.
///
/// Unknown commands get the device's invalid-input banner. Commands listed
/// in `failing` produce a transport error.
#[derive(Clone, Default)]
pub(crate) struct MockConnector {
    replies: HashMap<String, String>,
    failing: Vec<String>,
    refuse_connect: bool,
    pub log: Arc<Mutex<MockLog>>,
}

pub(crate) const INVALID_BANNER: &str = "\n% Invalid input detected at '^' marker.\n";

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, command: &str, output: &str) -> Self {
        self.replies.insert(command.to_string(), output.to_string());
        self
    }

    pub fn fail_on(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }

    pub fn refuse_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.log.lock().unwrap().sent.clone()
    }

    pub fn session(&self) -> MockSession {
        MockSession {
            replies: self.replies.clone(),
            failing: self.failing.clone(),
            log: self.log.clone(),
        }
    }
}

impl Connector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, _params: &ConnectionParameters) -> Result<MockSession> {
        if self.refuse_connect {
            return Err(TransportError::AuthenticationFailed {
                user: "admin".to_string(),
            }
            .into());
        }
        self.log.lock().unwrap().connects += 1;
        Ok(self.session())
    }
}

pub(crate) struct MockSession {
    replies: HashMap<String, String>,
    failing: Vec<String>,
    log: Arc<Mutex<MockLog>>,
}

impl Session for MockSession {
    async fn send_command(&mut self, command: &str) -> Result<String> {
        self.log.lock().unwrap().sent.push(command.to_string());
        if self.failing.iter().any(|c| c == command) {
            return Err(TransportError::Disconnected.into());
        }
        Ok(self
            .replies
            .get(command)
            .cloned()
            .unwrap_or_else(|| format!("{}{}", command, INVALID_BANNER)))
    }

    async fn enable(&mut self) -> Result<()> {
        self.log.lock().unwrap().enables += 1;
        Ok(())
    }

    async fn disconnect(self) -> Result<()> {
        self.log.lock().unwrap().disconnects += 1;
        Ok(())
    }
}
