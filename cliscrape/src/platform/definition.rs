//! Platform definition for vendor-specific configuration.

use indexmap::IndexMap;
use regex::bytes::Regex;

use super::privilege_level::PrivilegeLevel;

/// Vendor-specific CLI configuration.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "cisco_s300").
    pub name: String,

    /// Vendor reported in device facts.
    pub vendor: String,

    /// Privilege levels, root first.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Privilege level the driver works in.
    pub default_privilege: String,

    /// Substring the device prints when it rejects a command.
    pub invalid_marker: String,

    /// `User Name:` prompt of a login that happens inside the shell.
    pub username_prompt: Option<Regex>,

    /// Password prompt of the in-shell login.
    pub password_prompt: Option<Regex>,

    /// Commands to run when the session is established.
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vendor: vendor.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            invalid_marker: String::new(),
            username_prompt: None,
            password_prompt: None,
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Add a privilege level.
    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    /// Set the default privilege level.
    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    /// Set the invalid-command marker.
    pub fn with_invalid_marker(mut self, marker: impl Into<String>) -> Self {
        self.invalid_marker = marker.into();
        self
    }

    /// Set the prompts of an in-shell login.
    pub fn with_shell_login(
        mut self,
        username_prompt: &str,
        password_prompt: &str,
    ) -> Result<Self, regex::Error> {
        self.username_prompt = Some(Regex::new(username_prompt)?);
        self.password_prompt = Some(Regex::new(password_prompt)?);
        Ok(self)
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Get a privilege level by name.
    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// Find the privilege level whose prompt matches.
    pub fn privilege_for_prompt(&self, prompt: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.values().find(|level| level.matches(prompt))
    }
}
