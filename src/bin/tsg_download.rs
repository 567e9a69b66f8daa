//! Negotiate an agreement for an external artifact and download it.
//!
//! Picks the n-th artifact (document order) from the external connector's
//! catalogs, requests a contract agreement for its offer, then fetches the
//! artifact under that agreement.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::env;
use std::path::PathBuf;
use tsg_client::{
    ArtifactFilter, ArtifactRequest, ConnectorConfig, TransferOutcome, TsgClient, logging,
};

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

    let description =
        client.get_connector_self_description(&cli.connector_id, &cli.access_url, &cli.agent_id)?;
    let mut filter = ArtifactFilter::new();
    if let Some(catalog) = &cli.catalog {
        filter = filter.catalog(catalog.as_str());
    }
    let artifacts = client.parse_catalog_artifacts(&description, &filter, Utc::now())?;
    let Some(artifact) = artifacts.get(cli.index) else {
        bail!(
            "connector {} offers {} artifact(s); index {} is out of range",
            cli.connector_id,
            artifacts.len(),
            cli.index
        );
    };
    let Some(access_url) = artifact.access_url.clone() else {
        bail!("artifact {} publishes no access URL", artifact.id);
    };

    let agreement =
        client.request_agreement(&cli.connector_id, &access_url, &artifact.contract_offer)?;
    eprintln!("contract agreement: {agreement}");

    let request = ArtifactRequest {
        artifact_id: artifact.id.clone(),
        access_url,
        connector_id: cli.connector_id.clone(),
        agent_id: cli.agent_id.clone(),
        transfer_contract: agreement,
        keep_original_format: !cli.as_text,
        dir: cli.dir.clone(),
    };
    match client.request_data_artifact(&request)? {
        TransferOutcome::Saved(saved) => println!("{}", saved.message),
        TransferOutcome::Unsupported { content_type } => bail!(
            "unsupported format {}; retry with --as-text",
            content_type.as_deref().unwrap_or("<none>")
        ),
    }
    Ok(())
}

struct Cli {
    connector_id: String,
    access_url: String,
    agent_id: String,
    catalog: Option<String>,
    index: usize,
    dir: PathBuf,
    as_text: bool,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut connector_id = None;
        let mut access_url = None;
        let mut agent_id = String::new();
        let mut catalog = None;
        let mut index = 0usize;
        let mut dir = PathBuf::from(".");
        let mut as_text = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--connector-id" => connector_id = Some(next_value(&mut args, "--connector-id")?),
                "--access-url" => access_url = Some(next_value(&mut args, "--access-url")?),
                "--agent-id" => agent_id = next_value(&mut args, "--agent-id")?,
                "--catalog" => catalog = Some(next_value(&mut args, "--catalog")?),
                "--index" => {
                    let raw = next_value(&mut args, "--index")?;
                    index = raw
                        .parse()
                        .with_context(|| format!("--index expects a number, got {raw}"))?;
                }
                "--dir" => dir = PathBuf::from(next_value(&mut args, "--dir")?),
                "--as-text" => as_text = true,
                "--help" | "-h" => usage(0),
                other => bail!("unknown argument: {other}"),
            }
        }

        match (connector_id, access_url) {
            (Some(connector_id), Some(access_url)) => Ok(Self {
                connector_id,
                access_url,
                agent_id,
                catalog,
                index,
                dir,
                as_text,
            }),
            _ => usage(1),
        }
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: tsg-download --connector-id ID --access-url URL [--agent-id ID] [--catalog ID]\n\
         \x20                   [--index N] [--dir DIR] [--as-text]\n\
         Downloads artifact N (default 0) of the external connector into DIR (default .)."
    );
    std::process::exit(code);
}
