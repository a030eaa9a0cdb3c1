//! Device facts scraped from `show` output.
//!
//! Parsing is pure: the same three text blobs always give the same
//! [`DeviceFacts`], independent of the order they were collected in.
//!
//! ```text
//! show system:
//!   System Description:     SG300-28 28-Port Gigabit Managed Switch
//!   System Up Time (days,hour:min:sec):  45,23:02:04
//!   System Name:            switch1
//!
//! show system id:
//!   Serial number : PSZ20161234
//!
//! show version:
//!   SW version    1.4.5.02 ( date  20-Apr-2016 time  12:22:49 )
//! ```

mod scrape;
mod uptime;

pub use uptime::{UptimeDuration, parse_uptime};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::platform::s300::VENDOR;

/// Placeholder for string facts that could not be scraped.
pub const UNKNOWN: &str = "Unknown";

/// Facts about a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFacts {
    pub vendor: String,
    /// Seconds since boot, `-1` when the device did not report it.
    pub uptime: i64,
    pub hostname: String,
    pub serial_number: String,
    pub os_version: String,
    pub model: String,
}

/// How to treat fields whose pattern is missing from the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Missing serial number is an error, every other field falls back.
    #[default]
    Standard,

    /// Every field falls back; a missing serial number is logged.
    Lenient,

    /// Every missing string field is an error.
    Strict,
}

/// Turns raw `show` output into [`DeviceFacts`].
#[derive(Debug, Clone)]
pub struct FactParser {
    mode: ParseMode,
    vendor: String,
}

impl Default for FactParser {
    fn default() -> Self {
        Self::new(ParseMode::default())
    }
}

impl FactParser {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            vendor: VENDOR.to_string(),
        }
    }

    /// Report a different vendor string.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Parse the output of `show system`, `show system id` and `show version`.
    ///
    /// A missing uptime label gives `uptime == -1` in every mode; an uptime
    /// label followed by a malformed value is always an error.
    pub fn parse(
        &self,
        raw_system: &str,
        raw_system_id: &str,
        raw_version: &str,
    ) -> Result<DeviceFacts, ParseError> {
        let uptime = scrape::uptime(raw_system)?.unwrap_or(-1);

        let hostname = self.optional(scrape::hostname(raw_system), "hostname", scrape::HOSTNAME_LABEL)?;
        let model = self.optional(scrape::model(raw_system), "model", scrape::DESCRIPTION_LABEL)?;
        let os_version = self.optional(scrape::os_version(raw_version), "os_version", scrape::VERSION_LABEL)?;

        let serial_number = match scrape::serial_number(raw_system_id) {
            Some(serial) => serial.to_string(),
            None if self.mode == ParseMode::Lenient => {
                warn!(
                    "No '{}' delimiter in show system id output; serial number unknown",
                    scrape::SERIAL_DELIMITER
                );
                UNKNOWN.to_string()
            }
            None => {
                return Err(ParseError::MissingField {
                    field: "serial_number",
                    delimiter: scrape::SERIAL_DELIMITER,
                });
            }
        };

        Ok(DeviceFacts {
            vendor: self.vendor.clone(),
            uptime,
            hostname,
            serial_number,
            os_version,
            model,
        })
    }

    fn optional(
        &self,
        value: Option<&str>,
        field: &'static str,
        label: &'static str,
    ) -> Result<String, ParseError> {
        match (value, self.mode) {
            (Some(value), _) => Ok(value.to_string()),
            (None, ParseMode::Strict) => Err(ParseError::MissingField {
                field,
                delimiter: label,
            }),
            (None, _) => Ok(UNKNOWN.to_string()),
        }
    }
}

/// Parse facts with the default [`ParseMode`].
pub fn parse_facts(
    raw_system: &str,
    raw_system_id: &str,
    raw_version: &str,
) -> Result<DeviceFacts, ParseError> {
    FactParser::default().parse(raw_system, raw_system_id, raw_version)
}
