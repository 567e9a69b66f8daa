//! List the connectors registered at the metadata broker.

use anyhow::{Context, Result, bail};
use std::env;
use tsg_client::{ConnectorConfig, TsgClient, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let raw = parse_args()?;
    dotenv::dotenv().ok();
    logging::init_tracing();

    let config = ConnectorConfig::from_env()?;
    let client = TsgClient::connect(config).context("connecting to our connector")?;

    if raw {
        let listing = client.query_metadata_broker()?;
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        let connectors = client.broker_connectors()?;
        println!("{}", serde_json::to_string_pretty(&connectors)?);
    }
    Ok(())
}

/// Returns whether `--raw` was requested.
fn parse_args() -> Result<bool> {
    let mut raw = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--raw" => raw = true,
            "--help" | "-h" => usage(0),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(raw)
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: tsg-broker [--raw]\n\
         Prints a summary (or with --raw the full listing) of connectors at METADATA_BROKER_URL."
    );
    std::process::exit(code);
}
