//! Device platform definitions.
//!
//! A [`PlatformDefinition`] holds everything vendor specific that the
//! session and the executor need: prompts, the invalid-command marker and
//! the commands that prepare a fresh session.

mod definition;
mod privilege_level;
pub mod s300;

pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;
