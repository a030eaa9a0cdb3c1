//! Driver for the Cisco S300 switch family.

use futures_util::future::BoxFuture;
use log::{debug, warn};

use super::command_set::CommandSet;
use super::config_retriever::{ConfigScope, ConfigSnapshot, retrieve_config};
use super::executor::{CommandExecutor, Commands};
use super::response::Response;
use super::NetworkDriver;
use crate::error::{DriverError, Result};
use crate::facts::{DeviceFacts, FactParser};
use crate::transport::{ConnectionParameters, Connector, Session, SshConnector};

/// Driver owning at most one session to an S300 switch.
///
/// Every operation takes `&mut self`, so a driver can never be used by two
/// callers at once; share it behind a mutex if needed.
pub struct S300Driver<C: Connector = SshConnector> {
    /// Connection parameters.
    params: ConnectionParameters,

    /// Produces the session on open.
    connector: C,

    /// Session (None when closed).
    session: Option<C::Session>,

    executor: CommandExecutor,
    commands: CommandSet,
    parser: FactParser,
}

impl<C: Connector> S300Driver<C> {
    /// Create a closed driver.
    pub fn new(
        params: ConnectionParameters,
        connector: C,
        executor: CommandExecutor,
        commands: CommandSet,
        parser: FactParser,
    ) -> Self {
        Self {
            params,
            connector,
            session: None,
            executor,
            commands,
            parser,
        }
    }

    /// Get the connection parameters.
    pub fn params(&self) -> &ConnectionParameters {
        &self.params
    }

    /// Get the fact parser.
    pub fn parser(&self) -> &FactParser {
        &self.parser
    }

    /// Get the commands used for facts and configuration.
    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Open the driver, run `f`, and close the driver again.
    ///
    /// The session is closed on every path, including when `f` fails. An
    /// error from `f` takes precedence over one from closing.
    ///
    /// ```rust,no_run
    /// use cliscrape::driver::{DriverBuilder, NetworkDriver};
    ///
    /// # async fn example() -> Result<(), cliscrape::Error> {
    /// let mut driver = DriverBuilder::new("switch1").username("admin").password("secret").build()?;
    /// let facts = driver
    ///     .scoped(|driver| Box::pin(async move { driver.get_facts().await }))
    ///     .await?;
    /// println!("{} up {}s", facts.hostname, facts.uptime);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scoped<T, F>(&mut self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T>>,
    {
        self.open().await?;
        let outcome = f(self).await;
        let closed = self.close().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!(
                    "Closing {} after a failed operation also failed: {}",
                    self.params.hostname(),
                    close_err
                );
                Err(e)
            }
        }
    }
}

impl<C: Connector> NetworkDriver for S300Driver<C> {
    async fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let mut session = self.connector.connect(&self.params).await?;

        if let Err(e) = session.enable().await {
            if let Err(close_err) = session.disconnect().await {
                warn!(
                    "Disconnect from {} after failed enable also failed: {}",
                    self.params.hostname(),
                    close_err
                );
            }
            return Err(e);
        }

        debug!("Session to {} open", self.params.hostname());
        self.session = Some(session);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            session.disconnect().await?;
            debug!("Session to {} closed", self.params.hostname());
        }
        Ok(())
    }

    async fn send_command(&mut self, commands: &Commands) -> Result<Response> {
        let session = self.session.as_mut().ok_or(DriverError::NotConnected)?;
        self.executor.execute(session, commands).await
    }

    async fn get_facts(&mut self) -> Result<DeviceFacts> {
        let session = self.session.as_mut().ok_or(DriverError::NotConnected)?;

        let system = self.executor.execute(session, &self.commands.system).await?;
        let system_id = self.executor.execute(session, &self.commands.system_id).await?;
        let version = self.executor.execute(session, &self.commands.version).await?;

        let facts = self
            .parser
            .parse(&system.result, &system_id.result, &version.result)?;
        debug!(
            "Facts for {}: model={} os_version={}",
            self.params.hostname(),
            facts.model,
            facts.os_version
        );
        Ok(facts)
    }

    async fn get_config(&mut self, scope: ConfigScope) -> Result<ConfigSnapshot> {
        let session = self.session.as_mut().ok_or(DriverError::NotConnected)?;
        retrieve_config(&self.executor, session, &self.commands, scope).await
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::driver::DriverBuilder;
    use crate::error::{ParseError, TransportError};
    use crate::facts::ParseMode;
    use crate::transport::mock::MockConnector;

    const SHOW_SYSTEM: &str = "\
System Description:                       SG300-10 10-Port Gigabit Managed Switch
System Up Time (days,hour:min:sec):       45,23:02:04
System Name:                              lab-sw1";

    fn device() -> MockConnector {
        MockConnector::new()
            .reply("show system", SHOW_SYSTEM)
            .reply("show system id", "Serial number : DNI1234567")
            .reply(
                "show version",
                "SW version    1.4.5.02 ( date  20-Apr-2016 time  12:22:49 )",
            )
            .reply("show startup-config", "hostname lab-sw1\n")
            .reply("show running-config", "hostname lab-sw1\nvlan 10\n")
    }

    fn driver(mock: &MockConnector) -> S300Driver<MockConnector> {
        DriverBuilder::new("lab-sw1")
            .username("admin")
            .password("secret")
            .build_with(mock.clone())
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_enables_once() {
        let mock = device();
        let mut driver = driver(&mock);

        assert!(!driver.is_open());
        driver.open().await.unwrap();
        assert!(driver.is_open());

        let log = mock.log.lock().unwrap();
        assert_eq!(log.connects, 1);
        assert_eq!(log.enables, 1);
    }

    #[tokio::test]
    async fn test_operations_require_open_session() {
        let mock = device();
        let mut driver = driver(&mock);

        assert!(matches!(
            driver.get_facts().await,
            Err(Error::Driver(DriverError::NotConnected))
        ));
        assert!(matches!(
            driver.get_config(ConfigScope::All).await,
            Err(Error::Driver(DriverError::NotConnected))
        ));
        assert!(matches!(
            driver.send_command(&Commands::single("show system")).await,
            Err(Error::Driver(DriverError::NotConnected))
        ));

        driver.open().await.unwrap();
        driver.close().await.unwrap();
        assert!(matches!(
            driver.get_facts().await,
            Err(Error::Driver(DriverError::NotConnected))
        ));
        assert!(mock.sent().is_empty());
    }

    #[tokio::test]
    async fn test_double_open_rejected() {
        let mock = device();
        let mut driver = driver(&mock);

        driver.open().await.unwrap();
        assert!(matches!(
            driver.open().await,
            Err(Error::Driver(DriverError::AlreadyConnected))
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mock = device();
        let mut driver = driver(&mock);

        driver.close().await.unwrap();
        driver.open().await.unwrap();
        driver.close().await.unwrap();
        driver.close().await.unwrap();
        assert_eq!(mock.log.lock().unwrap().disconnects, 1);
    }

    #[tokio::test]
    async fn test_get_facts() {
        let mock = device();
        let mut driver = driver(&mock);
        driver.open().await.unwrap();

        let facts = driver.get_facts().await.unwrap();
        assert_eq!(facts.vendor, "Cisco");
        assert_eq!(facts.hostname, "lab-sw1");
        assert_eq!(facts.model, "SG300-10");
        assert_eq!(facts.serial_number, "DNI1234567");
        assert_eq!(facts.os_version, "1.4.5.02");
        assert_eq!(facts.uptime, 3_972_124);
        assert_eq!(
            mock.sent(),
            vec!["show system", "show system id", "show version"]
        );

        // Not cached: a second call goes back to the device
        driver.get_facts().await.unwrap();
        assert_eq!(mock.sent().len(), 6);
    }

    #[tokio::test]
    async fn test_get_facts_parse_error_propagates() {
        let mock = device().reply("show system id", "DNI1234567");
        let mut driver = driver(&mock);
        driver.open().await.unwrap();

        assert!(matches!(
            driver.get_facts().await,
            Err(Error::Parse(ParseError::MissingField {
                field: "serial_number",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_lenient_facts() {
        let mock = device().reply("show system id", "DNI1234567");
        let mut driver = DriverBuilder::new("lab-sw1")
            .username("admin")
            .parse_mode(ParseMode::Lenient)
            .build_with(mock.clone())
            .unwrap();
        driver.open().await.unwrap();

        let facts = driver.get_facts().await.unwrap();
        assert_eq!(facts.serial_number, "Unknown");
    }

    #[tokio::test]
    async fn test_facts_with_fallback_command() {
        let mock = device()
            .reply("show system unit 1 id", "% Invalid input detected at '^' marker.");
        let commands = CommandSet {
            system_id: Commands::from(["show system unit 1 id", "show system id"]),
            ..CommandSet::default()
        };
        let mut driver = DriverBuilder::new("lab-sw1")
            .username("admin")
            .commands(commands)
            .build_with(mock.clone())
            .unwrap();
        driver.open().await.unwrap();

        let facts = driver.get_facts().await.unwrap();
        assert_eq!(facts.serial_number, "DNI1234567");
    }

    #[tokio::test]
    async fn test_get_config_scopes() {
        let mock = device();
        let mut driver = driver(&mock);
        driver.open().await.unwrap();

        let all = driver.get_config(ConfigScope::All).await.unwrap();
        assert_eq!(all.startup, "hostname lab-sw1\n");
        assert_eq!(all.running, "hostname lab-sw1\nvlan 10\n");

        let startup = driver.get_config(ConfigScope::Startup).await.unwrap();
        assert_eq!(startup.running, "");
        assert_eq!(startup.startup, "hostname lab-sw1\n");
    }

    #[tokio::test]
    async fn test_send_command_passthrough() {
        let mock = device();
        let mut driver = driver(&mock);
        driver.open().await.unwrap();

        let response = driver
            .send_command(&Commands::from(["show bogus", "show version"]))
            .await
            .unwrap();
        assert_eq!(response.command, "show version");
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_scoped_closes_on_success() {
        let mock = device();
        let mut driver = driver(&mock);

        let facts = driver
            .scoped(|driver| Box::pin(async move { driver.get_facts().await }))
            .await
            .unwrap();

        assert_eq!(facts.hostname, "lab-sw1");
        assert!(!driver.is_open());
        assert_eq!(mock.log.lock().unwrap().disconnects, 1);
    }

    #[tokio::test]
    async fn test_scoped_closes_on_failure() {
        let mock = device().fail_on("show version");
        let mut driver = driver(&mock);

        let result = driver
            .scoped(|driver| Box::pin(async move { driver.get_facts().await }))
            .await;

        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::Disconnected))
        ));
        assert!(!driver.is_open());
        assert_eq!(mock.log.lock().unwrap().disconnects, 1);
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_driver_closed() {
        let mock = device().refuse_connect();
        let mut driver = driver(&mock);

        assert!(matches!(
            driver.open().await,
            Err(Error::Transport(TransportError::AuthenticationFailed { .. }))
        ));
        assert!(!driver.is_open());
    }
}
