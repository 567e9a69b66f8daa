//! Generate a contract-offer template and save it to disk.

use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;
use tsg_client::{ContractTemplate, logging, parse_timestamp, save_contract};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse()?;

    parse_timestamp("--start", &cli.start)?;
    parse_timestamp("--end", &cli.end)?;

    let template = match cli.id {
        Some(id) => ContractTemplate::new(id, cli.start, cli.end),
        None => ContractTemplate::with_random_id(cli.start, cli.end),
    };
    let path = save_contract(&template, &cli.dir)?;
    println!("{}", path.display());
    Ok(())
}

struct Cli {
    id: Option<String>,
    start: String,
    end: String,
    dir: PathBuf,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut id = None;
        let mut start = None;
        let mut end = None;
        let mut dir = PathBuf::from("docs").join("contracts");

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--id" => id = Some(next_value(&mut args, "--id")?),
                "--start" => start = Some(next_value(&mut args, "--start")?),
                "--end" => end = Some(next_value(&mut args, "--end")?),
                "--dir" => dir = PathBuf::from(next_value(&mut args, "--dir")?),
                "--help" | "-h" => usage(0),
                other => bail!("unknown argument: {other}"),
            }
        }

        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { id, start, end, dir }),
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
        "Usage: tsg-contract --start TS --end TS [--id ID] [--dir DIR]\n\
         Writes DIR/contract_<ID>.json (default DIR: docs/contracts, default ID: random UUID)."
    );
    std::process::exit(code);
}
