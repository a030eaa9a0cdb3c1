//! Cisco Small Business S300 platform definition.
//!
//! Covers the SG300/SF300 family with the following privilege levels:
//! - `exec` - User EXEC mode with `>` prompt
//! - `privilege_exec` - Privileged EXEC mode with `#` prompt
//!
//! # Prompt Examples
//!
//! ```text
//! switch1>                 # exec mode
//! switch1#                 # privilege_exec mode
//! switch1(config)#         # configuration mode (never entered by this crate)
//! ```
//!
//! Paging is turned off with `terminal datadump` instead of the IOS
//! `terminal length 0`.
//!
//! Switches without SSH password authentication (`ip ssh password-auth`
//! off) accept any SSH user and then ask again inside the shell:
//!
//! ```text
//! User Name:admin
//! Password:********
//! switch1#
//! ```
//!
//! The session answers that login with the same username and password.

use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Platform name for the S300 family.
pub const PLATFORM_NAME: &str = "cisco_s300";

/// Vendor reported in device facts.
pub const VENDOR: &str = "Cisco";

/// Substring the S300 prints when it rejects a command.
pub const INVALID_MARKER: &str = "% Invalid";

pub const SHOW_SYSTEM: &str = "show system";
pub const SHOW_SYSTEM_ID: &str = "show system id";
pub const SHOW_VERSION: &str = "show version";
pub const SHOW_STARTUP_CONFIG: &str = "show startup-config";
pub const SHOW_RUNNING_CONFIG: &str = "show running-config";

/// Password prompt of both the in-shell login and `enable`.
const PASSWORD_PROMPT: &str = r"(?mi)^password:\s?$";

/// User name prompt of the in-shell login.
const USERNAME_PROMPT: &str = r"(?mi)^user name:\s?$";

/// Create the S300 platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"(?m)^[\w.\-@()/: ]{1,63}>\s?$")
        .expect("valid exec prompt pattern");

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?m)^[\w.\-@()/: ]{1,63}#\s?$")
        .expect("valid privilege_exec prompt pattern")
        .with_parent("exec")
        .with_escalate("enable")
        .with_auth(PASSWORD_PROMPT)
        .expect("valid password prompt pattern")
        .with_not_contains("(config");

    PlatformDefinition::new(PLATFORM_NAME, VENDOR)
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_default_privilege("privilege_exec")
        .with_invalid_marker(INVALID_MARKER)
        .with_on_open_command("terminal datadump")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24)
        .with_shell_login(USERNAME_PROMPT, PASSWORD_PROMPT)
        .expect("valid login prompt patterns")
}
