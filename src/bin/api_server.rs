// HTTP API server binary for the game catalog

use anyhow::Result;
use game_catalog::api::ApiServer;
use game_catalog::database_ops::db::Db;
use game_catalog::util::env as env_util;
use game_catalog::util::logging::{init_tracing, DEFAULT_FILTER};

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing(DEFAULT_FILTER)?;

    tracing::info!("Initializing game catalog API server");

    let server = ApiServer::from_env()?;

    let database_url = env_util::db_url();
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);
    let db = Db::connect(&database_url, max_connections).await?;

    tracing::info!("Database ready");

    server.run(db).await?;

    Ok(())
}
