//! Prompt-driven reads and writes over an interactive shell.
//!
//! [`Shell`] owns the read buffer and knows the device prompts; the bytes
//! themselves come from a [`ShellIo`], which is the russh channel in
//! production and a scripted shell in tests.

use std::future::Future;
use std::time::Duration;

use log::debug;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use crate::channel::{PatternBuffer, normalize_output, trailing_prompt};
use crate::error::{DriverError, Result, TransportError};
use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Raw byte transport under a [`Shell`].
pub(crate) trait ShellIo: Send {
    /// Write bytes to the shell.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Next chunk of output, `None` once the shell is gone.
    fn next_chunk(&mut self) -> impl Future<Output = Option<Vec<u8>>> + Send;
}

impl ShellIo for Channel<Msg> {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.data(data).await.map_err(TransportError::Ssh)?;
        Ok(())
    }

    async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.wait().await? {
                ChannelMsg::Data { data } | ChannelMsg::ExtendedData { data, .. } => {
                    return Some(data.to_vec());
                }
                ChannelMsg::Eof | ChannelMsg::Close => return None,
                _ => {}
            }
        }
    }
}

/// An interactive shell positioned at a device prompt.
pub(crate) struct Shell<I> {
    host: String,
    io: I,
    buffer: PatternBuffer,
    prompt_pattern: Regex,
    read_timeout: Duration,
    /// Prompt seen at the end of the last read.
    prompt: String,
}

impl<I: ShellIo> Shell<I> {
    pub fn new(host: impl Into<String>, io: I, prompt_pattern: Regex, read_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            io,
            buffer: PatternBuffer::default(),
            prompt_pattern,
            read_timeout,
            prompt: String::new(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[cfg(test)]
    fn io(&self) -> &I {
        &self.io
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.io.write(format!("{}\n", line).as_bytes()).await
    }

    /// Read until `pattern` matches in the buffer tail.
    ///
    /// Fails with [`TransportError::Timeout`] once `read_timeout` has passed
    /// since the call, and with [`TransportError::Disconnected`] when the
    /// shell closes first.
    async fn read_until(&mut self, pattern: &Regex) -> Result<String> {
        let deadline = Instant::now().checked_add(self.read_timeout);

        while !self.buffer.tail_contains(pattern) {
            let chunk = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, self.io.next_chunk())
                    .await
                    .map_err(|_| TransportError::Timeout(self.read_timeout))?,
                None => self.io.next_chunk().await,
            };

            match chunk {
                Some(data) => self.buffer.extend(&data),
                None => return Err(TransportError::Disconnected.into()),
            }
        }

        Ok(self.buffer.take_string())
    }

    /// Read up to the next device prompt and remember it.
    pub async fn read_until_prompt(&mut self) -> Result<String> {
        let pattern = self.prompt_pattern.clone();
        let raw = self.read_until(&pattern).await?;
        self.prompt = trailing_prompt(&raw).to_string();
        Ok(raw)
    }

    /// Send one command and return its normalized output.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        self.write_line(command).await?;
        let raw = self.read_until_prompt().await?;
        Ok(normalize_output(&raw, command))
    }

    /// Wait for the first prompt, answering an in-shell login on the way.
    pub async fn login(
        &mut self,
        platform: &PlatformDefinition,
        username: &str,
        password: &SecretString,
    ) -> Result<()> {
        let Some(username_prompt) = &platform.username_prompt else {
            self.read_until_prompt().await?;
            return Ok(());
        };

        let raw = self.read_until(&either(username_prompt, &self.prompt_pattern)?).await?;
        if !at_prompt(username_prompt, &raw) {
            self.prompt = trailing_prompt(&raw).to_string();
            return Ok(());
        }

        debug!("{}: answering in-shell login for '{}'", self.host, username);
        self.write_line(username).await?;

        if let Some(password_prompt) = &platform.password_prompt {
            let raw = self.read_until(&either(password_prompt, &self.prompt_pattern)?).await?;
            if !at_prompt(password_prompt, &raw) {
                self.prompt = trailing_prompt(&raw).to_string();
                return Ok(());
            }
            self.write_line(password.expose_secret()).await?;
        }

        let raw = self.read_until(&either(username_prompt, &self.prompt_pattern)?).await?;
        if at_prompt(username_prompt, &raw) {
            return Err(TransportError::AuthenticationFailed {
                user: username.to_string(),
            }
            .into());
        }

        self.prompt = trailing_prompt(&raw).to_string();
        Ok(())
    }

    /// Move to the platform's default privilege level.
    ///
    /// A password prompt is answered with `secret`, or with `password` when
    /// `secret` is empty.
    pub async fn enable(
        &mut self,
        platform: &PlatformDefinition,
        password: &SecretString,
        secret: &SecretString,
    ) -> Result<()> {
        let Some(escalation) = escalation(platform, &self.prompt)? else {
            debug!("{}: already at '{}'", self.host, self.prompt);
            return Ok(());
        };
        let target = escalation.target;

        debug!(
            "{}: escalating to '{}' with '{}'",
            self.host, target.name, escalation.command
        );
        self.write_line(escalation.command).await?;

        let mut raw = match &target.escalate_prompt {
            Some(auth) => self.read_until(&either(auth, &self.prompt_pattern)?).await?,
            None => self.read_until(&self.prompt_pattern.clone()).await?,
        };

        if asked_for_password(target, &raw) {
            self.write_line(enable_secret(password, secret).expose_secret())
                .await?;
            raw = self.read_until(&self.prompt_pattern.clone()).await?;
        }

        self.prompt = trailing_prompt(&raw).to_string();
        verify_privilege(target, &self.prompt)?;
        Ok(())
    }
}

/// The step needed to reach a privilege level.
#[derive(Debug)]
struct Escalation<'p> {
    target: &'p PrivilegeLevel,
    command: &'p str,
}

/// Work out how to reach the default privilege level from `prompt`.
///
/// `None` means there is nothing to do. Escalation is only attempted from
/// the target's parent level.
fn escalation<'p>(
    platform: &'p PlatformDefinition,
    prompt: &str,
) -> std::result::Result<Option<Escalation<'p>>, DriverError> {
    let Some(target) = platform.get_privilege(&platform.default_privilege) else {
        return Ok(None);
    };
    if target.matches(prompt) {
        return Ok(None);
    }

    let failed = || DriverError::PrivilegeAcquisitionFailed {
        target: target.name.clone(),
    };

    let current = platform.privilege_for_prompt(prompt).ok_or_else(failed)?;
    if target.previous_priv.as_deref() != Some(current.name.as_str()) {
        return Err(failed());
    }

    let command = target.escalate_command.as_deref().ok_or_else(failed)?;
    Ok(Some(Escalation { target, command }))
}

/// A regex matching either pattern.
fn either(first: &Regex, second: &Regex) -> Result<Regex> {
    Regex::new(&format!("(?:{})|(?:{})", first.as_str(), second.as_str())).map_err(|e| {
        DriverError::InvalidConfig {
            message: format!("invalid prompt pattern: {e}"),
        }
        .into()
    })
}

/// Whether the last line of `raw` is a `pattern` prompt.
fn at_prompt(pattern: &Regex, raw: &str) -> bool {
    pattern.is_match(trailing_prompt(raw).as_bytes())
}

fn asked_for_password(target: &PrivilegeLevel, raw: &str) -> bool {
    target
        .escalate_prompt
        .as_ref()
        .is_some_and(|auth| at_prompt(auth, raw))
}

/// The enable secret, falling back to the login password.
fn enable_secret<'a>(password: &'a SecretString, secret: &'a SecretString) -> &'a SecretString {
    if secret.expose_secret().is_empty() {
        password
    } else {
        secret
    }
}

fn verify_privilege(target: &PrivilegeLevel, prompt: &str) -> std::result::Result<(), DriverError> {
    if target.matches(prompt) {
        Ok(())
    } else {
        Err(DriverError::PrivilegeAcquisitionFailed {
            target: target.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::Error;
    use crate::channel::combined_prompt_pattern;
    use crate::platform::s300;

    /// Shell that answers each write with the next scripted reply.
    #[derive(Default)]
    struct ScriptedIo {
        pending: VecDeque<Vec<u8>>,
        replies: VecDeque<&'static str>,
        written: Vec<String>,
        closed: bool,
    }

    impl ScriptedIo {
        fn banner(chunks: &[&str]) -> Self {
            Self {
                pending: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
                ..Self::default()
            }
        }

        fn then(mut self, reply: &'static str) -> Self {
            self.replies.push_back(reply);
            self
        }

        fn closed(mut self) -> Self {
            self.closed = true;
            self
        }
    }

    impl ShellIo for ScriptedIo {
        async fn write(&mut self, data: &[u8]) -> Result<()> {
            self.written
                .push(String::from_utf8_lossy(data).trim_end().to_string());
            if let Some(reply) = self.replies.pop_front() {
                self.pending.push_back(reply.as_bytes().to_vec());
            }
            Ok(())
        }

        async fn next_chunk(&mut self) -> Option<Vec<u8>> {
            match self.pending.pop_front() {
                Some(chunk) => Some(chunk),
                None if self.closed => None,
                None => std::future::pending().await,
            }
        }
    }

    fn shell(io: ScriptedIo) -> Shell<ScriptedIo> {
        let platform = s300::platform();
        let pattern = combined_prompt_pattern(platform.privilege_levels.values()).unwrap();
        Shell::new("switch1:22", io, pattern, Duration::from_millis(200))
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    async fn ready(io: ScriptedIo) -> Shell<ScriptedIo> {
        let mut shell = shell(io);
        shell.read_until_prompt().await.unwrap();
        shell
    }

    #[tokio::test]
    async fn test_prompt_split_across_chunks() {
        let shell = ready(ScriptedIo::banner(&["\r\nswi", "tch1", "#"])).await;
        assert_eq!(shell.prompt(), "switch1#");
    }

    #[tokio::test]
    async fn test_send_command_strips_echo_and_prompt() {
        let mut shell = ready(
            ScriptedIo::banner(&["switch1#"])
                .then("show system id\r\nSerial number : PSZ20161234\r\nswitch1#"),
        )
        .await;

        let output = shell.send_command("show system id").await.unwrap();
        assert_eq!(output, "Serial number : PSZ20161234");
        assert_eq!(shell.io().written, vec!["show system id"]);
    }

    #[tokio::test]
    async fn test_read_times_out_without_prompt() {
        let mut shell = shell(ScriptedIo::banner(&["Loading..."]));
        let result = shell.read_until_prompt().await;
        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_read_fails_when_shell_closes() {
        let mut shell = shell(ScriptedIo::banner(&["Loading..."]).closed());
        let result = shell.read_until_prompt().await;
        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::Disconnected))
        ));
    }

    #[tokio::test]
    async fn test_enable_skipped_when_privileged() {
        let mut shell = ready(ScriptedIo::banner(&["switch1#"])).await;

        shell
            .enable(&s300::platform(), &secret("pw"), &secret(""))
            .await
            .unwrap();
        assert!(shell.io().written.is_empty());
    }

    #[tokio::test]
    async fn test_enable_answers_with_secret() {
        let mut shell = ready(
            ScriptedIo::banner(&["switch1>"])
                .then("enable\r\nPassword:")
                .then("\r\nswitch1#"),
        )
        .await;

        shell
            .enable(&s300::platform(), &secret("login-pw"), &secret("enable-pw"))
            .await
            .unwrap();
        assert_eq!(shell.io().written, vec!["enable", "enable-pw"]);
        assert_eq!(shell.prompt(), "switch1#");
    }

    #[tokio::test]
    async fn test_enable_falls_back_to_login_password() {
        let mut shell = ready(
            ScriptedIo::banner(&["switch1>"])
                .then("enable\r\nPassword:")
                .then("\r\nswitch1#"),
        )
        .await;

        shell
            .enable(&s300::platform(), &secret("login-pw"), &secret(""))
            .await
            .unwrap();
        assert_eq!(shell.io().written, vec!["enable", "login-pw"]);
    }

    #[tokio::test]
    async fn test_enable_without_password_prompt() {
        let mut shell = ready(ScriptedIo::banner(&["switch1>"]).then("enable\r\nswitch1#")).await;

        shell
            .enable(&s300::platform(), &secret("pw"), &secret("enable-pw"))
            .await
            .unwrap();
        assert_eq!(shell.io().written, vec!["enable"]);
    }

    #[tokio::test]
    async fn test_enable_rejected_secret() {
        let mut shell = ready(
            ScriptedIo::banner(&["switch1>"])
                .then("enable\r\nPassword:")
                .then("\r\n% Access denied\r\nswitch1>"),
        )
        .await;

        let result = shell
            .enable(&s300::platform(), &secret("pw"), &secret("wrong"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Driver(DriverError::PrivilegeAcquisitionFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_enable_refused_outside_exec() {
        let mut shell = ready(ScriptedIo::banner(&["switch1(config)#"])).await;

        let result = shell
            .enable(&s300::platform(), &secret("pw"), &secret(""))
            .await;
        assert!(matches!(
            result,
            Err(Error::Driver(DriverError::PrivilegeAcquisitionFailed { .. }))
        ));
        assert!(shell.io().written.is_empty());
    }

    #[tokio::test]
    async fn test_shell_login_answered() {
        let mut shell = shell(
            ScriptedIo::banner(&["\r\n\r\nUser Name:"])
                .then("admin\r\nPassword:")
                .then("********\r\n\r\nswitch1#"),
        );

        shell
            .login(&s300::platform(), "admin", &secret("pw"))
            .await
            .unwrap();
        assert_eq!(shell.io().written, vec!["admin", "pw"]);
        assert_eq!(shell.prompt(), "switch1#");
    }

    #[tokio::test]
    async fn test_shell_login_skipped_at_prompt() {
        let mut shell = shell(ScriptedIo::banner(&["\r\nswitch1>"]));

        shell
            .login(&s300::platform(), "admin", &secret("pw"))
            .await
            .unwrap();
        assert!(shell.io().written.is_empty());
        assert_eq!(shell.prompt(), "switch1>");
    }

    #[tokio::test]
    async fn test_shell_login_rejected() {
        let mut shell = shell(
            ScriptedIo::banner(&["User Name:"])
                .then("admin\r\nPassword:")
                .then("****\r\nUser Name:"),
        );

        let result = shell.login(&s300::platform(), "admin", &secret("bad")).await;
        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::AuthenticationFailed { .. }))
        ));
    }

    #[test]
    fn test_escalation_decisions() {
        let platform = s300::platform();

        assert!(escalation(&platform, "switch1#").unwrap().is_none());

        let step = escalation(&platform, "switch1>").unwrap().unwrap();
        assert_eq!(step.target.name, "privilege_exec");
        assert_eq!(step.command, "enable");

        assert!(escalation(&platform, "switch1(config)#").is_err());
    }

    #[test]
    fn test_auth_or_prompt_pattern() {
        let platform = s300::platform();
        let target = platform.get_privilege("privilege_exec").unwrap();
        let prompt = combined_prompt_pattern(platform.privilege_levels.values()).unwrap();
        let pattern = either(target.escalate_prompt.as_ref().unwrap(), &prompt).unwrap();

        assert!(pattern.is_match(b"enable\r\nPassword:"));
        assert!(pattern.is_match(b"switch1#"));
        assert!(!pattern.is_match(b"enable\r\n"));

        assert!(asked_for_password(target, "enable\r\nPassword:"));
        assert!(!asked_for_password(target, "enable\r\nswitch1#"));
    }

    #[test]
    fn test_enable_secret_choice() {
        let password = secret("login-pw");
        assert_eq!(
            enable_secret(&password, &secret("")).expose_secret(),
            "login-pw"
        );
        assert_eq!(
            enable_secret(&password, &secret("enable-pw")).expose_secret(),
            "enable-pw"
        );
    }

    #[test]
    fn test_verify_privilege() {
        let platform = s300::platform();
        let target = platform.get_privilege("privilege_exec").unwrap();
        assert!(verify_privilege(target, "switch1#").is_ok());
        assert!(verify_privilege(target, "switch1>").is_err());
        assert!(verify_privilege(target, "switch1(config)#").is_err());
    }
}
