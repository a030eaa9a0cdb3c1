//! High-level driver for device interaction.
//!
//! The driver layer turns the generic device-management operations
//! (open, close, facts, config) into CLI command sequences.

mod builder;
mod command_set;
mod config_retriever;
mod executor;
mod response;
mod s300;

pub use builder::DriverBuilder;
pub use command_set::CommandSet;
pub use config_retriever::{ConfigScope, ConfigSnapshot};
pub use executor::{CommandCandidate, CommandExecutor, Commands, MarkerRejection, RejectionCheck};
pub use response::Response;
pub use s300::S300Driver;

use std::future::Future;

use crate::error::Result;
use crate::facts::DeviceFacts;

/// Operations every device driver provides.
pub trait NetworkDriver: Send {
    /// Open the session to the device and enter privileged mode.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the session. Closing a closed driver is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a single command or a fallback list.
    fn send_command(&mut self, commands: &Commands) -> impl Future<Output = Result<Response>> + Send;

    /// Collect and parse device facts. Never cached.
    fn get_facts(&mut self) -> impl Future<Output = Result<DeviceFacts>> + Send;

    /// Fetch startup and/or running configuration.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use cliscrape::driver::{ConfigScope, NetworkDriver};
    ///
    /// # async fn example(driver: &mut impl NetworkDriver) -> Result<(), cliscrape::Error> {
    /// let configs = driver.get_config(ConfigScope::Running).await?;
    /// assert!(configs.startup.is_empty());
    /// println!("{}", configs.running);
    /// # Ok(())
    /// # }
    /// ```
    fn get_config(
        &mut self,
        scope: ConfigScope,
    ) -> impl Future<Output = Result<ConfigSnapshot>> + Send;

    /// Check if the driver has an open session.
    fn is_open(&self) -> bool;
}
