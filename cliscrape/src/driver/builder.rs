//! Builder for creating device drivers.

use std::time::Duration;

use super::command_set::CommandSet;
use super::executor::CommandExecutor;
use super::s300::S300Driver;
use crate::error::{DriverError, Result};
use crate::facts::{FactParser, ParseMode};
use crate::platform::{PlatformDefinition, s300};
use crate::transport::config::DEFAULT_TIMEOUT;
use crate::transport::{
    ConnectionParameters, Connector, OptionValue, OptionalArgs, SshConnector,
    TransportCapabilities,
};

/// Builder for constructing device drivers.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use cliscrape::driver::DriverBuilder;
///
/// # fn example() -> Result<(), cliscrape::Error> {
/// let driver = DriverBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .timeout(Duration::from_secs(30))
///     .optional_arg("port", 2222i64)
///     .optional_arg("secret", "enable-pw")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    hostname: String,
    username: Option<String>,
    password: String,
    timeout: Duration,
    optional_args: OptionalArgs,
    capabilities: TransportCapabilities,
    parse_mode: ParseMode,
    platform: PlatformDefinition,
    commands: CommandSet,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            username: None,
            password: String::new(),
            timeout: DEFAULT_TIMEOUT,
            optional_args: OptionalArgs::new(),
            capabilities: TransportCapabilities::default(),
            parse_mode: ParseMode::default(),
            platform: s300::platform(),
            commands: CommandSet::default(),
        }
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the connection and command timeout (default: 60s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set one optional transport argument.
    pub fn optional_arg(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.optional_args.insert(key.into(), value.into());
        self
    }

    /// Merge a map of optional transport arguments.
    pub fn optional_args(mut self, args: OptionalArgs) -> Self {
        self.optional_args.extend(args);
        self
    }

    /// Describe what the transport supports.
    pub fn capabilities(mut self, capabilities: TransportCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set how strictly facts are parsed.
    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    /// Use a custom platform definition.
    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = platform;
        self
    }

    /// Override the commands used for facts and configuration.
    pub fn commands(mut self, commands: CommandSet) -> Self {
        self.commands = commands;
        self
    }

    /// Build a driver that connects over SSH.
    ///
    /// This creates the driver but does not connect. Call `open()` on the
    /// returned driver to establish the connection.
    pub fn build(self) -> Result<S300Driver<SshConnector>> {
        let connector = SshConnector::new(self.platform.clone());
        self.build_with(connector)
    }

    /// Build a driver around a custom connector.
    pub fn build_with<C: Connector>(self, connector: C) -> Result<S300Driver<C>> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;

        if self.hostname.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: "Hostname is required".to_string(),
            }
            .into());
        }

        let params = ConnectionParameters::new(
            self.hostname,
            username,
            self.password,
            self.timeout,
            &self.optional_args,
            self.capabilities,
        )?;

        let executor = CommandExecutor::new(self.platform.invalid_marker.clone());
        let parser = FactParser::new(self.parse_mode).with_vendor(self.platform.vendor.clone());

        Ok(S300Driver::new(
            params,
            connector,
            executor,
            self.commands,
            parser,
        ))
    }
}
