//! Session transport.
//!
//! The driver only ever talks to a [`Session`]: send a command, get text
//! back. [`SshConnector`] produces sessions over SSH via russh; tests use a
//! scripted session instead.

pub mod config;
#[cfg(test)]
pub(crate) mod mock;
mod shell;
mod ssh;

pub use config::{
    AuthMethod, ConnectionParameters, HostKeyVerification, OptionValue, OptionalArgs,
    TransportCapabilities, TransportOptions,
};
pub use ssh::{SshConnector, SshSession};

use std::future::Future;

use crate::error::Result;

/// An authenticated, interactive channel to a device.
pub trait Session: Send {
    /// Send one command and return its output once the prompt comes back.
    ///
    /// The output has the command echo and trailing prompt removed but is
    /// otherwise untouched, error banners included.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Enter privileged mode. Called once, right after connecting.
    fn enable(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Tear the session down.
    fn disconnect(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sessions from connection parameters.
pub trait Connector: Send + Sync {
    /// The session type this connector produces.
    type Session: Session;

    /// Connect and authenticate.
    fn connect(
        &self,
        params: &ConnectionParameters,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}
