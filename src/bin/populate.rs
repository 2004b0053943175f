use anyhow::{Context, Result};
use clap::Parser;
use game_catalog::catalog::{self, CatalogClient, CatalogSources};
use game_catalog::database_ops::db::Db;
use game_catalog::util::env;
use game_catalog::util::logging::{init_tracing, DEFAULT_FILTER};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "populate",
    version,
    about = "Import the android and ios top-lists into the games table"
)]
struct Cli {
    /// Optional override for the database URL
    #[arg(long)]
    db_url: Option<String>,
    /// Optional override for ANDROID_CATALOG_URL
    #[arg(long)]
    android_url: Option<String>,
    /// Optional override for IOS_CATALOG_URL
    #[arg(long)]
    ios_url: Option<String>,
    /// HTTP timeout for each catalog request, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing(DEFAULT_FILTER)?;
    let cli = Cli::parse();

    let defaults = CatalogSources::from_env()?;
    let sources = CatalogSources::new(
        cli.android_url.as_deref().unwrap_or(defaults.android.as_str()),
        cli.ios_url.as_deref().unwrap_or(defaults.ios.as_str()),
    )?;
    let client = match cli.timeout_secs {
        Some(secs) => CatalogClient::new(secs)?,
        None => CatalogClient::from_env()?,
    };

    let db_url = cli.db_url.unwrap_or_else(env::db_url);
    let db = Db::connect(&db_url, env::env_parse("DB_MAX_CONNS", 5u32)).await?;

    let summary = catalog::populate(&client, &db, &sources)
        .await
        .context("catalog import failed")?;
    info!(
        created = summary.created,
        updated = summary.updated,
        failed = summary.failed,
        "done"
    );
    println!("{}", summary.message());
    Ok(())
}
