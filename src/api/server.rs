// API server implementation using actix-web

use crate::api::handlers::CatalogImport;
use crate::api::static_files::StaticDir;
use crate::api::{middleware, routes};
use crate::catalog::{CatalogClient, CatalogSources};
use crate::database_ops::db::Db;
use crate::util::env::{env_or, env_parse};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub static_dir: PathBuf,
    pub catalog: CatalogImport,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_or("API_HOST", "0.0.0.0");
        let port = env_or("API_PORT", "3000")
            .trim()
            .parse()
            .context("Invalid API_PORT")?;
        let allowed_origins = env_or("ALLOWED_ORIGINS", "http://localhost:3000");
        let static_dir = PathBuf::from(env_or("STATIC_DIR", "./static"));

        let catalog = CatalogImport {
            client: CatalogClient::from_env()?,
            sources: CatalogSources::from_env()?,
        };

        Ok(Self {
            host,
            port,
            allowed_origins,
            static_dir,
            catalog,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, db: Db) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            static_dir = %self.static_dir.display(),
            android_catalog = %self.catalog.sources.android,
            ios_catalog = %self.catalog.sources.ios,
            "Starting game catalog API server"
        );

        let db_data = web::Data::new(db);
        let catalog_data = web::Data::new(self.catalog);
        let static_data = web::Data::new(StaticDir(self.static_dir));
        let allowed_origins = self.allowed_origins;
        let workers = env_parse("API_WORKERS", 0usize);

        let mut server = HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(db_data.clone())
                .app_data(catalog_data.clone())
                .app_data(static_data.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        });
        if workers > 0 {
            server = server.workers(workers);
        }

        server
            .bind(&bind_addr)
            .with_context(|| format!("Failed to bind to {}", bind_addr))?
            .run()
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
