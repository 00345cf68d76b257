//! CLINIQ Server — Application entry point.

use cliniq_core::repository::ClinicStore;
use cliniq_db::{DbConfig, DbManager, SurrealStore};
use cliniq_policy::audit;
use cliniq_policy::config::PolicyConfig;
use cliniq_policy::services::Services;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("cliniq=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting CLINIQ server...");

    let db_config = DbConfig::from_env();
    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };
    if let Err(e) = cliniq_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "failed to run migrations");
        std::process::exit(1);
    }

    let store = SurrealStore::new(manager.client().clone());
    let policy_config = PolicyConfig::from_env();
    if policy_config.bootstrap_exemption {
        tracing::warn!("bootstrap exemption is enabled; disable it after initial data loading");
    }

    // Audit entries drain to storage in the background for the life of
    // the process.
    let (recorder, outbox) = audit::channel(store.audit().clone());
    let drain = tokio::spawn(outbox.run());

    let services = Services::new(store, recorder, &policy_config);

    // TODO: serve the REST transport on top of these services.

    tracing::info!("CLINIQ server ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for the shutdown signal");
    }

    tracing::info!("Shutting down, flushing the audit outbox...");

    // Dropping the services closes the recorder side; the drain task
    // persists whatever is still queued and exits.
    drop(services);
    if let Err(e) = drain.await {
        tracing::error!(error = %e, "audit drain task failed");
    }

    tracing::info!("CLINIQ server stopped.");
}
