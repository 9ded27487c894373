mod config;
mod error;
mod logging;
mod models;
mod rest;

use config::{Config, StorageBackend};
use error::StartupError;
use models::DeviceStores;
use tracing::{error, info};

#[tokio::main]
pub async fn main() {
    logging::init();

    if let Err(err) = run().await {
        error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    info!(
        "Starting mushroom {} (core {})",
        env!("CARGO_PKG_VERSION"),
        mushroom_core::CORE_VERSION
    );

    match config.storage() {
        StorageBackend::Postgres(database_url) => {
            let db_conn =
                models::establish_db_connection(database_url, config.max_connections()).await?;
            models::migrate(&db_conn).await?;
            info!("Connected to database");

            let result = rest::dispatch_server(&config, DeviceStores::postgres(&db_conn)).await;
            db_conn.close().await;
            info!("Closed database connection");
            result
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage, devices are lost on shutdown");
            rest::dispatch_server(&config, DeviceStores::memory()).await
        }
    }
}
