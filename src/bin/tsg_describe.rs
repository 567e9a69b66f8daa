//! Print the artifacts a connector offers.
//!
//! Fetches an external connector's self-description through our own
//! connector (or our own with `--own`), applies the artifact filters, and
//! prints the matching descriptors as a JSON array.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::env;
use tsg_client::{ArtifactFilter, ConnectorConfig, TsgClient, logging, parse_timestamp};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    dotenv::dotenv().ok();
    logging::init_tracing();

    let config = ConnectorConfig::from_env()?;
    let client = TsgClient::connect(config).context("connecting to our connector")?;

    let description = match &cli.target {
        Target::Own => client.get_own_self_description()?,
        Target::External {
            connector_id,
            access_url,
            agent_id,
        } => client.get_connector_self_description(connector_id, access_url, agent_id)?,
    };

    let artifacts = client.parse_catalog_artifacts(&description, &cli.filter, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&artifacts)?);
    Ok(())
}

enum Target {
    Own,
    External {
        connector_id: String,
        access_url: String,
        agent_id: String,
    },
}

struct Cli {
    target: Target,
    filter: ArtifactFilter,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut own = false;
        let mut connector_id: Option<String> = None;
        let mut access_url: Option<String> = None;
        let mut agent_id: Option<String> = None;
        let mut filter = ArtifactFilter::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--own" => own = true,
                "--connector-id" => connector_id = Some(next_value(&mut args, "--connector-id")?),
                "--access-url" => access_url = Some(next_value(&mut args, "--access-url")?),
                "--agent-id" => agent_id = Some(next_value(&mut args, "--agent-id")?),
                "--catalog" => filter = filter.catalog(next_value(&mut args, "--catalog")?),
                "--type" => filter = filter.resource_type(next_value(&mut args, "--type")?),
                "--after" => {
                    let raw = next_value(&mut args, "--after")?;
                    filter = filter.created_after(parse_timestamp("--after", &raw)?);
                }
                "--before" => {
                    let raw = next_value(&mut args, "--before")?;
                    filter = filter.created_before(parse_timestamp("--before", &raw)?);
                }
                "--last" => filter = filter.last_only(),
                "--valid-only" => filter = filter.valid_contract_only(),
                "--help" | "-h" => usage(0),
                other => bail!("unknown argument: {other}"),
            }
        }

        let target = if own {
            if connector_id.is_some() || access_url.is_some() {
                bail!("--own cannot be combined with --connector-id/--access-url");
            }
            Target::Own
        } else {
            match (connector_id, access_url) {
                (Some(connector_id), Some(access_url)) => Target::External {
                    connector_id,
                    access_url,
                    agent_id: agent_id.unwrap_or_default(),
                },
                _ => usage(1),
            }
        };

        Ok(Self { target, filter })
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: tsg-describe (--own | --connector-id ID --access-url URL [--agent-id ID])\n\
         \x20                   [--catalog ID] [--type TYPE] [--after TS] [--before TS] [--last] [--valid-only]\n\
         Timestamps use %Y-%m-%dT%H:%M:%S.%fZ, e.g. 2024-03-19T21:47:18.009Z.\n\
         Connector settings come from API_KEY, CONNECTOR_ID, ACCESS_URL, AGENT_ID (or .env)."
    );
    std::process::exit(code);
}
