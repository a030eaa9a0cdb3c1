//! # cliscrape
//!
//! Async SSH CLI scraping driver for Cisco S300 series switches.
//!
//! cliscrape logs into a switch over SSH, enters privileged mode and turns
//! the text output of `show` commands into structured device facts and
//! configuration snapshots.
//!
//! ## Features
//!
//! - Async SSH sessions via russh
//! - Fallback command lists for firmware that spells commands differently
//! - Fact scraping from `show system`, `show system id` and `show version`
//! - Startup and running configuration retrieval with JSON snapshots
//! - Efficient pattern buffer matching (tail search)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cliscrape::{ConfigScope, DriverBuilder, NetworkDriver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cliscrape::Error> {
//!     let mut driver = DriverBuilder::new("192.168.1.254")
//!         .username("cisco")
//!         .password("cisco")
//!         .optional_arg("secret", "enable-secret")
//!         .build()?;
//!
//!     driver.open().await?;
//!
//!     let facts = driver.get_facts().await?;
//!     println!("{} ({}) serial {}", facts.hostname, facts.model, facts.serial_number);
//!
//!     let configs = driver.get_config(ConfigScope::Running).await?;
//!     println!("{}", configs.running);
//!
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod facts;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    CommandCandidate, CommandExecutor, CommandSet, Commands, ConfigScope, ConfigSnapshot,
    DriverBuilder, NetworkDriver, Response, S300Driver,
};
pub use error::Error;
pub use facts::{DeviceFacts, FactParser, ParseMode, parse_facts};
pub use platform::{PlatformDefinition, PrivilegeLevel};
pub use transport::{ConnectionParameters, OptionValue, OptionalArgs, TransportCapabilities};
