mod client;

use clap::{Arg, Command};
use client::PveClient;
use pvemon_core::{config::CliConfig, scrape, Config};
use std::{path::PathBuf, process};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let matches = Command::new("pvemon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Prometheus exporter for Proxmox VE clusters")
        .arg(
            Arg::new("target")
                .value_name("HOST")
                .help("Cluster node to scrape")
                .required(true),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("USER")
                .help("API user, e.g. root@pam"),
        )
        .arg(
            Arg::new("token-id")
                .long("token-id")
                .value_name("ID")
                .help("API token id"),
        )
        .arg(
            Arg::new("token-secret")
                .long("token-secret")
                .value_name("SECRET")
                .env("PVEMON_TOKEN_SECRET")
                .help("API token secret"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Cluster API port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("insecure")
                .long("insecure")
                .help("Skip TLS certificate verification")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json-config")
                .long("json-config")
                .value_name("PATH")
                .help("Path to JSON configuration file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .get_matches();

    // Build CLI configuration
    let cli_config = CliConfig {
        user: matches.get_one::<String>("user").cloned(),
        token_id: matches.get_one::<String>("token-id").cloned(),
        token_secret: matches.get_one::<String>("token-secret").cloned(),
        port: matches.get_one::<u16>("port").copied(),
        insecure: matches.get_flag("insecure"),
        timeout_secs: matches.get_one::<u64>("timeout").copied(),
    };

    // Load configuration
    let json_config_path = matches.get_one::<PathBuf>("json-config");
    let config = Config::load(Some(&cli_config), json_config_path)?;

    let target = matches
        .get_one::<String>("target")
        .expect("target is required");

    let client = PveClient::new(target, &config)?;
    let output = scrape(&client)?;
    print!("{}", output);

    Ok(())
}
