use std::sync::Arc;

use schoolrun::config::Config;
use schoolrun::db::{MemoryStore, PgStore, Store};
use schoolrun::engine::Engine;
use schoolrun::error::Error;
use schoolrun::server::serve;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("schoolrun=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.max_connections).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, keeping all state in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let engine = Engine::with_store(store, config.engine)?;

    serve(engine, config.listen_addr).await
}
