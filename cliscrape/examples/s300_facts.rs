//! Facts example: Collect facts and configuration from a Cisco S300 switch
//!
//! This example logs into a switch, enters privileged mode, prints the
//! device facts and optionally saves a configuration snapshot as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example s300_facts -- --host 192.168.1.254 --user cisco --password cisco
//! ```
//!
//! Save both configurations:
//! ```bash
//! cargo run --example s300_facts -- --host sw1 --user cisco --password cisco --save sw1.json
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use cliscrape::{
    CommandCandidate, CommandSet, Commands, ConfigScope, DriverBuilder, NetworkDriver, ParseMode,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}:{}...", args.host, args.port);

    // Some firmware only knows the stack-unit form of `show system id`
    let commands = CommandSet {
        system_id: Commands::Fallback(vec![
            CommandCandidate::new("show system id").labeled("standalone"),
            CommandCandidate::new("show system unit 1 id").labeled("stack"),
        ]),
        ..CommandSet::default()
    };

    let mut builder = DriverBuilder::new(&args.host)
        .username(&args.user)
        .password(&args.password)
        .timeout(Duration::from_secs(args.timeout))
        .optional_arg("port", i64::from(args.port))
        .optional_arg("verbose", args.verbose)
        .commands(commands);

    if let Some(secret) = &args.secret {
        builder = builder.optional_arg("secret", secret.as_str());
    }
    if args.lenient {
        builder = builder.parse_mode(ParseMode::Lenient);
    }

    let mut driver = builder.build()?;

    let save = args.save.clone();
    let facts = driver
        .scoped(|driver| {
            Box::pin(async move {
                let facts = driver.get_facts().await?;
                if let Some(path) = &save {
                    let configs = driver.get_config(ConfigScope::All).await?;
                    configs.save(path)?;
                    println!("Saved configuration to {}", path.display());
                }
                Ok(facts)
            })
        })
        .await?;

    println!("{}", "-".repeat(50));
    println!("Vendor:        {}", facts.vendor);
    println!("Hostname:      {}", facts.hostname);
    println!("Model:         {}", facts.model);
    println!("Serial number: {}", facts.serial_number);
    println!("OS version:    {}", facts.os_version);
    println!("Uptime:        {}s", facts.uptime);
    println!("{}", "-".repeat(50));

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    secret: Option<String>,
    timeout: u64,
    verbose: bool,
    lenient: bool,
    save: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "192.168.1.254".to_string();
        let mut port = 22u16;
        let mut user = "cisco".to_string();
        let mut password = String::new();
        let mut secret = None;
        let mut timeout = 60u64;
        let mut verbose = false;
        let mut lenient = false;
        let mut save = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = args[i].clone();
                    }
                }
                "--secret" | "-s" => {
                    i += 1;
                    if i < args.len() {
                        secret = Some(args[i].clone());
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(60);
                    }
                }
                "--save" => {
                    i += 1;
                    if i < args.len() {
                        save = Some(PathBuf::from(&args[i]));
                    }
                }
                "--verbose" | "-v" => verbose = true,
                "--lenient" => lenient = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            host,
            port,
            user,
            password,
            secret,
            timeout,
            verbose,
            lenient,
            save,
        }
    }

    fn print_help() {
        println!(
            r#"cliscrape s300_facts example

USAGE:
    cargo run --example s300_facts -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Target switch [default: 192.168.1.254]
    -p, --port <PORT>        SSH port [default: 22]
    -u, --user <USER>        Username [default: cisco]
    -P, --password <PASS>    Login password
    -s, --secret <SECRET>    Enable secret [default: login password]
    -t, --timeout <SECS>     Timeout [default: 60]
    -v, --verbose            Log every command at debug level
    --lenient                Report a missing serial number as Unknown
    --save <PATH>            Save startup and running config as JSON
    --help                   Print this help message
"#
        );
    }
}
