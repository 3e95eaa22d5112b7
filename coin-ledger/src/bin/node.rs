//! Ledger node binary
//!
//! Boots the ledger from configuration, restores the persisted chain,
//! and saves it again on Ctrl-C. Request transport is provided by the
//! embedding service through [`coin_ledger::LedgerHandle`].

use coin_ledger::{actor, Config, Error, FileChainStore, Metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match std::env::var("COIN_LEDGER_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::from_env()?,
    };

    tracing::info!(service = %config.service_name, "Starting coin ledger node");

    let store = FileChainStore::open(&config)?;
    let ledger = actor::open(&config, Metrics::new().map_err(Error::from)?)?;

    if config.load_on_start {
        if let Some(bytes) = store.load()? {
            match ledger.load_chain(bytes).await {
                Ok(()) => tracing::info!(path = ?store.path(), "Restored persisted chain"),
                Err(e) => tracing::warn!(error = %e, "Persisted chain rejected, keeping fresh genesis"),
            }
        }
    }

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down ledger node");
    if config.save_on_shutdown {
        store.save(&ledger.save_chain().await?)?;
    }
    ledger.shutdown().await?;

    Ok(())
}
