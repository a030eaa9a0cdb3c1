//! Startup and running configuration retrieval.
//!
//! Configuration text is opaque here: no pagination, no size limit, no
//! transformation. A [`ConfigSnapshot`] can be stored as JSON and loaded
//! back byte for byte.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use super::command_set::CommandSet;
use super::executor::CommandExecutor;
use crate::error::{DriverError, Error, Result, StorageError};
use crate::transport::Session;

/// Which configuration(s) to fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    Startup,
    Running,
    #[default]
    All,
}

impl ConfigScope {
    pub fn includes_startup(self) -> bool {
        matches!(self, ConfigScope::Startup | ConfigScope::All)
    }

    pub fn includes_running(self) -> bool {
        matches!(self, ConfigScope::Running | ConfigScope::All)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigScope::Startup => "startup",
            ConfigScope::Running => "running",
            ConfigScope::All => "all",
        }
    }
}

impl FromStr for ConfigScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "startup" => Ok(ConfigScope::Startup),
            "running" => Ok(ConfigScope::Running),
            "all" => Ok(ConfigScope::All),
            other => Err(DriverError::InvalidConfig {
                message: format!(
                    "unknown config scope '{}', expected startup, running or all",
                    other
                ),
            }
            .into()),
        }
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device configuration text. Fields that were not requested are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub startup: String,
    pub running: String,
}

impl ConfigSnapshot {
    /// Write the snapshot as JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).map_err(StorageError::from)?;
        Ok(())
    }

    /// Read a snapshot written by [`to_writer`](Self::to_writer).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader).map_err(StorageError::from)?)
    }

    /// Save the snapshot to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(StorageError::from)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush().map_err(StorageError::from)?;
        Ok(())
    }

    /// Load a snapshot from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(StorageError::from)?;
        Self::from_reader(BufReader::new(file))
    }
}

/// Fetch the configuration(s) named by `scope`, startup first.
pub(crate) async fn retrieve_config<S: Session>(
    executor: &CommandExecutor,
    session: &mut S,
    commands: &CommandSet,
    scope: ConfigScope,
) -> Result<ConfigSnapshot> {
    let mut snapshot = ConfigSnapshot::default();

    if scope.includes_startup() {
        snapshot.startup = executor
            .execute(session, &commands.startup_config)
            .await?
            .into_result();
        debug!("Retrieved startup-config ({} bytes)", snapshot.startup.len());
    }

    if scope.includes_running() {
        snapshot.running = executor
            .execute(session, &commands.running_config)
            .await?
            .into_result();
        debug!("Retrieved running-config ({} bytes)", snapshot.running.len());
    }

    Ok(snapshot)
}
