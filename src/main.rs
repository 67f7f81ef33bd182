use bistro_pos::{
    backend::{BackendWriter, DocumentBackend, RelationalBackend},
    config::{
        database::{create_connection, create_tables, get_database_url},
        document::{create_document_store, get_redis_url},
        settings::load_default_config,
    },
    core::{coordinator::TransactionCoordinator, menu},
    errors::Result,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load config.toml
    let app_config = load_default_config()
        .inspect_err(|e| error!("Failed to load application configuration: {}", e))?;
    info!(
        preferred = %app_config.backends.preferred,
        mirror = ?app_config.backends.mirror,
        "Loaded application configuration"
    );

    // 4. Relational backend. The connection is lazy, so an unreachable
    //    database only shows up in the probe below.
    let db = create_connection(&get_database_url()).await?;
    if let Err(e) = create_tables(&db).await {
        warn!("Could not create tables: {}", e);
    } else if let Err(e) = menu::seed_menu_items(&db, &app_config.menu_items).await {
        warn!("Could not seed menu items: {}", e);
    }

    // 5. Document backend
    let store = create_document_store(&get_redis_url())?;
    let document = DocumentBackend::new(store)
        .with_write_probe(app_config.backends.document_probe_writes);

    // 6. Coordinator over both, then one probe for the status banner
    let coordinator = TransactionCoordinator::new(
        Arc::new(RelationalBackend::new(db)) as Arc<dyn BackendWriter>,
        Arc::new(document) as Arc<dyn BackendWriter>,
        &app_config.backends,
    );

    let report = coordinator.prober().probe_all().await;
    match report.primary_available {
        Some(backend) => info!(%backend, "Ready to take orders"),
        None => error!(
            relational = %report.relational.error_message(),
            document = %report.document.error_message(),
            "No backend available"
        ),
    }

    Ok(())
}
