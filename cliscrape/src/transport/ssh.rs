//! SSH session implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, trace, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::{ExposeSecret, SecretString};

use super::config::{AuthMethod, ConnectionParameters, HostKeyVerification};
use super::shell::Shell;
use super::{Connector, Session};
use crate::channel::combined_prompt_pattern;
use crate::error::{DriverError, Result, TransportError};
use crate::platform::{PlatformDefinition, s300};

/// Opens [`SshSession`]s for a platform.
#[derive(Debug, Clone)]
pub struct SshConnector {
    platform: PlatformDefinition,
}

impl SshConnector {
    pub fn new(platform: PlatformDefinition) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new(s300::platform())
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    async fn connect(&self, params: &ConnectionParameters) -> Result<SshSession> {
        let options = params.options();
        if let Some(path) = &options.ssh_config_file {
            debug!("ssh_config_file {} is not applied by the russh transport", path.display());
        }
        if let Some(allow_agent) = options.allow_agent {
            debug!("allow_agent={} is not applied by the russh transport", allow_agent);
        }

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(params.timeout()),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: params.hostname().to_string(),
            port: params.port(),
            host_key_verification: options.host_key_verification(),
            known_hosts_path: options.known_hosts_path().cloned(),
            host_key_error: host_key_error.clone(),
        };

        debug!("Connecting to {}", params.socket_addr());
        let mut session = tokio::time::timeout(
            params.timeout(),
            client::connect(ssh_config, (params.hostname(), params.port()), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(params.timeout()))?
        .map_err(|e| {
            // Prefer the detailed host key error over russh's generic one
            match host_key_error.lock().ok().and_then(|mut slot| slot.take()) {
                Some(hk_err) => hk_err,
                None => TransportError::Ssh(e),
            }
        })?;

        authenticate(&mut session, params).await?;

        let channel = open_shell(&session, &self.platform).await?;

        let prompt_pattern = combined_prompt_pattern(self.platform.privilege_levels.values())
            .map_err(|e| DriverError::InvalidConfig {
                message: format!("invalid prompt pattern for '{}': {e}", self.platform.name),
            })?;

        let mut shell = Shell::new(params.socket_addr(), channel, prompt_pattern, params.read_timeout());
        shell
            .login(&self.platform, params.username(), params.password())
            .await?;
        debug!("Initial prompt on {}: '{}'", params.socket_addr(), shell.prompt());

        let mut ssh_session = SshSession {
            host: params.socket_addr(),
            session,
            shell,
            platform: self.platform.clone(),
            password: params.password().clone(),
            secret: options.secret.clone(),
            verbose: options.verbose,
            disconnected: false,
        };

        for command in &self.platform.on_open_commands {
            ssh_session.send_command(command).await?;
        }

        Ok(ssh_session)
    }
}

/// Authenticate with the server.
async fn authenticate(session: &mut Handle<SshHandler>, params: &ConnectionParameters) -> Result<()> {
    let username = params.username();
    let success = match params.auth_method() {
        AuthMethod::Password(password) => session
            .authenticate_password(username, password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_secret_key(&path, passphrase.as_ref().map(|p| p.expose_secret()))
                .map_err(|e| TransportError::Key(e.to_string()))?;

            // Best RSA hash algorithm supported by the server
            let hash_alg = session
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();

            session
                .authenticate_publickey(
                    username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                )
                .await
                .map_err(TransportError::Ssh)?
                .success()
        }
    };

    if !success {
        return Err(TransportError::AuthenticationFailed {
            user: username.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Open a PTY shell channel.
async fn open_shell(
    session: &Handle<SshHandler>,
    platform: &PlatformDefinition,
) -> Result<Channel<Msg>> {
    let channel = session
        .channel_open_session()
        .await
        .map_err(TransportError::Ssh)?;

    channel
        .request_pty(
            true,
            "xterm",
            platform.terminal_width,
            platform.terminal_height,
            0,
            0,
            &[],
        )
        .await
        .map_err(TransportError::Ssh)?;

    channel
        .request_shell(true)
        .await
        .map_err(TransportError::Ssh)?;

    Ok(channel)
}

/// Interactive shell session on a device.
pub struct SshSession {
    host: String,
    session: Handle<SshHandler>,
    shell: Shell<Channel<Msg>>,
    platform: PlatformDefinition,
    password: SecretString,
    secret: SecretString,
    verbose: bool,
    disconnected: bool,
}

impl SshSession {
    /// The prompt seen at the end of the last command.
    pub fn prompt(&self) -> &str {
        self.shell.prompt()
    }
}

impl Session for SshSession {
    async fn send_command(&mut self, command: &str) -> Result<String> {
        if self.verbose {
            debug!("{}: sending '{}'", self.host, command);
        } else {
            trace!("{}: sending '{}'", self.host, command);
        }

        let output = self.shell.send_command(command).await?;
        trace!("{}: {} bytes back for '{}'", self.host, output.len(), command);
        Ok(output)
    }

    async fn enable(&mut self) -> Result<()> {
        self.shell
            .enable(&self.platform, &self.password, &self.secret)
            .await
    }

    async fn disconnect(mut self) -> Result<()> {
        debug!("Disconnecting from {}", self.host);
        self.disconnected = true;
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if !self.disconnected {
            warn!("SSH session to {} dropped without disconnect", self.host);
        }
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key error surfaced by connect().
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = match &self.known_hosts_path {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = match &self.known_hosts_path {
            Some(path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let accepted = match self.host_key_verification {
            HostKeyVerification::Disabled => true,

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    true
                }
                Err(e) => self.reject(e),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        };

        Ok(accepted)
    }
}
