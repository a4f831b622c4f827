//! Save and reload a job list through every backend kind
//!
//! Uses the platform directories (or `TYPED_STORAGE_*` overrides) and
//! clears everything it wrote before exiting.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage_core::{BackendKind, Storage, StorageContext};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Job {
    company: String,
    position: String,
    description: String,
    url: String,
}

fn sample_jobs() -> Vec<Job> {
    vec![
        Job {
            company: "Acme Corp".to_string(),
            position: "Storage Engineer".to_string(),
            description: "Keep the bytes where they belong".to_string(),
            url: "https://jobs.example.com/acme/storage".to_string(),
        },
        Job {
            company: "Globex".to_string(),
            position: "Rust Developer".to_string(),
            description: "Build typed persistence layers".to_string(),
            url: "https://jobs.example.com/globex/rust".to_string(),
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let context = Arc::new(StorageContext::from_env()?);
    info!("Cache root: {:?}", context.roots().cache_dir);
    info!("Document root: {:?}", context.roots().document_dir);

    let jobs = sample_jobs();

    for kind in [
        BackendKind::Cache,
        BackendKind::Document,
        BackendKind::Preferences,
        BackendKind::CloudKv,
    ] {
        let storage = Storage::<Vec<Job>>::new(context.clone(), kind.clone(), "jobs.json")?;
        storage.save(&jobs).await?;

        let loaded = storage.stored_value().await;
        info!(
            "{}: stored {} job(s) at {}, round trip ok: {}",
            kind,
            jobs.len(),
            storage.location(),
            loaded.as_ref() == Some(&jobs)
        );

        storage.clear().await;
        info!("{}: cleared, value present: {}", kind, storage.stored_value().await.is_some());
    }

    Ok(())
}
