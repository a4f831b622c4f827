//! Remember the last known position across runs, inside a throwaway sandbox

use std::sync::Arc;
use storage_core::{BackendKind, GeoLocation, LocationStorage, StorageConfig, StorageContext};
use tempfile::TempDir;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let sandbox = TempDir::new()?;
    let config = StorageConfig::rooted_at(sandbox.path());

    // First "run": record a fix
    {
        let context = Arc::new(StorageContext::from_config(&config)?);
        let storage = LocationStorage::new(context, BackendKind::Preferences, "lastLocation")?;

        let fix = GeoLocation::new(34.0522, -118.2437)
            .with_horizontal_accuracy(12.0)
            .with_motion(90.0, 3.2);
        storage.save(&fix).await?;
        info!("Saved fix at {}, {}", fix.latitude, fix.longitude);
    }

    // Second "run": a fresh context reads it back from the preference file
    {
        let context = Arc::new(StorageContext::from_config(&config)?);
        let storage = LocationStorage::new(context, BackendKind::Preferences, "lastLocation")?;

        match storage.stored_value().await {
            Some(fix) => info!(
                "Restored fix at {}, {} taken {}",
                fix.latitude, fix.longitude, fix.timestamp
            ),
            None => info!("No stored fix"),
        }

        storage.clear().await;
    }

    Ok(())
}
