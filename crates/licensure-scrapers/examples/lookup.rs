//! Example: look up a license in one jurisdiction and print the records as JSON.
//!
//! ```text
//! cargo run -p licensure-scrapers --example lookup -- WV --name Jane Doe
//! cargo run -p licensure-scrapers --example lookup -- FL --npn 1234567
//! cargo run -p licensure-scrapers --example lookup -- TX --license 1234567
//! ```
//!
//! Set `CAPSOLVER_API_KEY` to enable CA and TX. Ctrl-C cancels the lookup.

use anyhow::{bail, Context};
use licensure_core::{AppConfig, LookupQuery};
use licensure_scrapers::{LookupContext, Registry};
use tracing::info;

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,licensure=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn parse_args(args: &[String]) -> anyhow::Result<(String, LookupQuery)> {
    let usage = "usage: lookup <STATE> (--name <FIRST> <LAST> | --npn <NPN> | --license <NUMBER>)";
    let state = args.first().context(usage)?.clone();

    let query = match (args.get(1).map(String::as_str), &args[2.min(args.len())..]) {
        (Some("--name"), [first, last]) => LookupQuery::Name {
            first: first.clone(),
            last: last.clone(),
        },
        (Some("--npn"), [npn]) => LookupQuery::Npn { npn: npn.clone() },
        (Some("--license"), [number]) => LookupQuery::LicenseNumber {
            number: number.clone(),
        },
        _ => bail!(usage),
    };
    Ok((state, query))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (state, query) = parse_args(&args)?;

    let config = AppConfig::load_with_env().context("loading configuration")?;
    let registry = Registry::from_config(&config).context("building registry")?;

    let ctx = LookupContext::new();
    let cancel = ctx.cancel_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    info!(state = %state, query = query.kind(), "looking up license");
    let records = registry.lookup(&ctx, &state, &query).await?;

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
