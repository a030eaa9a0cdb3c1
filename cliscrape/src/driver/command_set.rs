//! The commands a driver sends for facts and configuration.

use super::executor::Commands;
use crate::platform::s300;

/// Commands used by `get_facts` and `get_config`.
///
/// Each entry may be a fallback list for firmware that spells a command
/// differently.
#[derive(Debug, Clone)]
pub struct CommandSet {
    pub system: Commands,
    pub system_id: Commands,
    pub version: Commands,
    pub startup_config: Commands,
    pub running_config: Commands,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self {
            system: Commands::single(s300::SHOW_SYSTEM),
            system_id: Commands::single(s300::SHOW_SYSTEM_ID),
            version: Commands::single(s300::SHOW_VERSION),
            startup_config: Commands::single(s300::SHOW_STARTUP_CONFIG),
            running_config: Commands::single(s300::SHOW_RUNNING_CONFIG),
        }
    }
}
