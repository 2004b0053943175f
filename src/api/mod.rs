// HTTP API for game records and the catalog import

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod static_files;

pub use server::ApiServer;
