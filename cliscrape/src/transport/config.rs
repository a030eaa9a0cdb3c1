//! Connection parameters and optional transport arguments.
//!
//! Optional arguments arrive as a loosely typed map (as they would from an
//! inventory file). Only recognized keys survive; anything else is dropped.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use log::debug;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, Result};

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default operation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default multiplier applied to read timeouts.
pub const DEFAULT_DELAY_FACTOR: f64 = 1.0;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys.
    Strict,

    /// Accept and learn unknown keys, reject changed keys.
    AcceptNew,

    /// Accept all keys without checking.
    #[default]
    Disabled,
}

/// Authentication method for SSH connections.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}

/// A loosely typed option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl OptionValue {
    fn kind(&self) -> &'static str {
        match self {
            OptionValue::Null => "null",
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "integer",
            OptionValue::Float(_) => "float",
            OptionValue::Str(_) => "string",
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

/// Raw optional arguments keyed by option name.
pub type OptionalArgs = IndexMap<String, OptionValue>;

/// What the session collaborator is able to honor.
///
/// Passed in at construction time instead of being inferred from the
/// version of whatever library sits underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportCapabilities {
    /// Whether the transport understands the `allow_agent` option.
    pub agent_forwarding: bool,
}

impl Default for TransportCapabilities {
    fn default() -> Self {
        Self {
            agent_forwarding: true,
        }
    }
}

impl TransportCapabilities {
    /// Capabilities of a transport that cannot forward an SSH agent.
    pub fn without_agent_forwarding() -> Self {
        Self {
            agent_forwarding: false,
        }
    }
}

/// Recognized optional argument names.
const PORT: &str = "port";
const SECRET: &str = "secret";
const VERBOSE: &str = "verbose";
const GLOBAL_DELAY_FACTOR: &str = "global_delay_factor";
const USE_KEYS: &str = "use_keys";
const KEY_FILE: &str = "key_file";
const SSH_STRICT: &str = "ssh_strict";
// Misspelled key accepted by older inventories.
const SSH_STRICT_LEGACY: &str = "ssh_scrict";
const SYSTEM_HOST_KEYS: &str = "system_host_keys";
const ALT_HOST_KEYS: &str = "alt_host_keys";
const ALT_KEY_FILE: &str = "alt_key_file";
const SSH_CONFIG_FILE: &str = "ssh_config_file";
const ALLOW_AGENT: &str = "allow_agent";

/// Typed view of the recognized optional arguments.
#[derive(Clone)]
pub struct TransportOptions {
    /// Port override.
    pub port: Option<u16>,

    /// Enable secret; empty means reuse the login password.
    pub secret: SecretString,

    /// Log every command at debug level.
    pub verbose: bool,

    /// Multiplier applied to read timeouts.
    pub global_delay_factor: f64,

    /// Authenticate with a private key instead of a password.
    pub use_keys: bool,

    /// Private key path used when `use_keys` is set.
    pub key_file: Option<PathBuf>,

    /// Reject hosts missing from known_hosts.
    pub ssh_strict: bool,

    /// Check host keys against the user's known_hosts.
    pub system_host_keys: bool,

    /// Check host keys against `alt_key_file`.
    pub alt_host_keys: bool,

    /// Alternate known_hosts file.
    pub alt_key_file: Option<PathBuf>,

    /// OpenSSH client config file.
    pub ssh_config_file: Option<PathBuf>,

    /// Agent forwarding; only present when the transport supports it.
    pub allow_agent: Option<bool>,

    retained: OptionalArgs,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            port: None,
            secret: SecretString::from(String::new()),
            verbose: false,
            global_delay_factor: DEFAULT_DELAY_FACTOR,
            use_keys: false,
            key_file: None,
            ssh_strict: false,
            system_host_keys: false,
            alt_host_keys: false,
            alt_key_file: None,
            ssh_config_file: None,
            allow_agent: None,
            retained: OptionalArgs::new(),
        }
    }
}

impl fmt::Debug for TransportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportOptions")
            .field("port", &self.port)
            .field("secret", &"<redacted>")
            .field("verbose", &self.verbose)
            .field("global_delay_factor", &self.global_delay_factor)
            .field("use_keys", &self.use_keys)
            .field("key_file", &self.key_file)
            .field("ssh_strict", &self.ssh_strict)
            .field("system_host_keys", &self.system_host_keys)
            .field("alt_host_keys", &self.alt_host_keys)
            .field("alt_key_file", &self.alt_key_file)
            .field("ssh_config_file", &self.ssh_config_file)
            .field("allow_agent", &self.allow_agent)
            .finish()
    }
}

impl TransportOptions {
    /// Build options from a raw map, dropping unrecognized keys.
    ///
    /// A recognized key carrying a value of the wrong type is rejected.
    pub fn from_args(args: &OptionalArgs, capabilities: TransportCapabilities) -> Result<Self> {
        let mut options = Self::default();

        for (key, value) in args {
            match key.as_str() {
                PORT => options.port = port_value(key, value)?,
                SECRET => {
                    options.secret = SecretString::from(string_value(key, value)?.unwrap_or_default())
                }
                VERBOSE => options.verbose = bool_value(key, value)?,
                GLOBAL_DELAY_FACTOR => options.global_delay_factor = delay_value(key, value)?,
                USE_KEYS => options.use_keys = bool_value(key, value)?,
                KEY_FILE => options.key_file = path_value(key, value)?,
                SSH_STRICT | SSH_STRICT_LEGACY => options.ssh_strict = bool_value(key, value)?,
                SYSTEM_HOST_KEYS => options.system_host_keys = bool_value(key, value)?,
                ALT_HOST_KEYS => options.alt_host_keys = bool_value(key, value)?,
                ALT_KEY_FILE => options.alt_key_file = path_value(key, value)?,
                SSH_CONFIG_FILE => options.ssh_config_file = path_value(key, value)?,
                ALLOW_AGENT if capabilities.agent_forwarding => {
                    options.allow_agent = Some(bool_value(key, value)?)
                }
                _ => {
                    debug!("Dropping unrecognized optional argument '{}'", key);
                    continue;
                }
            }
            options.retained.insert(key.clone(), value.clone());
        }

        Ok(options)
    }

    /// The recognized arguments exactly as they were supplied.
    pub fn retained(&self) -> &OptionalArgs {
        &self.retained
    }

    /// Host key verification mode derived from the strictness flags.
    pub fn host_key_verification(&self) -> HostKeyVerification {
        if self.ssh_strict {
            HostKeyVerification::Strict
        } else if self.system_host_keys || self.alt_host_keys {
            HostKeyVerification::AcceptNew
        } else {
            HostKeyVerification::Disabled
        }
    }

    /// known_hosts file override, honored only with `alt_host_keys`.
    pub fn known_hosts_path(&self) -> Option<&PathBuf> {
        if self.alt_host_keys {
            self.alt_key_file.as_ref()
        } else {
            None
        }
    }
}

fn type_error(key: &str, expected: &str, value: &OptionValue) -> crate::error::Error {
    DriverError::InvalidConfig {
        message: format!(
            "optional argument '{}' expects {}, got {}",
            key,
            expected,
            value.kind()
        ),
    }
    .into()
}

fn bool_value(key: &str, value: &OptionValue) -> Result<bool> {
    match value {
        OptionValue::Bool(b) => Ok(*b),
        OptionValue::Null => Ok(false),
        other => Err(type_error(key, "a bool", other)),
    }
}

fn string_value(key: &str, value: &OptionValue) -> Result<Option<String>> {
    match value {
        OptionValue::Str(s) => Ok(Some(s.clone())),
        OptionValue::Null => Ok(None),
        other => Err(type_error(key, "a string", other)),
    }
}

fn path_value(key: &str, value: &OptionValue) -> Result<Option<PathBuf>> {
    Ok(string_value(key, value)?
        .filter(|s| !s.is_empty())
        .map(PathBuf::from))
}

fn port_value(key: &str, value: &OptionValue) -> Result<Option<u16>> {
    match value {
        OptionValue::Null => Ok(None),
        OptionValue::Int(n) => u16::try_from(*n)
            .map(Some)
            .map_err(|_| type_error(key, "a port number", value)),
        other => Err(type_error(key, "a port number", other)),
    }
}

/// `timeout * factor`, rejected when it does not fit in a `Duration`.
fn scaled_timeout(timeout: Duration, factor: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(timeout.as_secs_f64() * factor).map_err(|_| {
        DriverError::InvalidConfig {
            message: format!(
                "timeout {:?} scaled by global_delay_factor {} is out of range",
                timeout, factor
            ),
        }
        .into()
    })
}

fn delay_value(key: &str, value: &OptionValue) -> Result<f64> {
    let factor = match value {
        OptionValue::Int(n) => *n as f64,
        OptionValue::Float(f) => *f,
        other => return Err(type_error(key, "a number", other)),
    };
    if !factor.is_finite() || factor <= 0.0 {
        return Err(type_error(key, "a positive number", value));
    }
    Ok(factor)
}

/// Everything needed to reach and log into a device.
///
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct ConnectionParameters {
    hostname: String,
    username: String,
    password: SecretString,
    timeout: Duration,
    read_timeout: Duration,
    port: u16,
    options: TransportOptions,
}

impl ConnectionParameters {
    /// Create connection parameters from credentials and raw optional args.
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
        optional_args: &OptionalArgs,
        capabilities: TransportCapabilities,
    ) -> Result<Self> {
        let options = TransportOptions::from_args(optional_args, capabilities)?;
        let read_timeout = scaled_timeout(timeout, options.global_delay_factor)?;
        Ok(Self {
            hostname: hostname.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            timeout,
            read_timeout,
            port: options.port.unwrap_or(DEFAULT_PORT),
            options,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Timeout for a single command read, scaled by the delay factor.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Authentication method implied by the options.
    pub fn auth_method(&self) -> AuthMethod {
        match (&self.options.key_file, self.options.use_keys) {
            (Some(path), true) => AuthMethod::PrivateKey {
                path: path.clone(),
                passphrase: None,
            },
            _ => AuthMethod::Password(self.password.clone()),
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
