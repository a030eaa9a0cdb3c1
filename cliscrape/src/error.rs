//! Error types for cliscrape.

use std::io;
use thiserror::Error;

/// Main error type for cliscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Errors scraping facts out of command output
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Errors saving or loading configuration snapshots
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Transport layer errors (SSH connection, authentication, reads).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Server presented a key that differs from known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Strict checking is on and the host is not in known_hosts
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Failed to read or update known_hosts
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Driver layer errors (session lifecycle, configuration, privilege).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Invalid configuration in the driver builder or a call argument
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Failed to reach privileged mode after `enable`
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },
}

/// Errors raised while scraping structured facts out of CLI text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required field's delimiter or label was not found
    #[error("Field '{field}' not found (expected '{delimiter}')")]
    MissingField {
        field: &'static str,
        delimiter: &'static str,
    },

    /// The uptime value did not look like `D,HH:MM:SS`
    #[error("Malformed uptime '{input}': {reason}")]
    MalformedUptime { input: String, reason: String },
}

/// Configuration snapshot storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the snapshot file failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The snapshot could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using cliscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;
