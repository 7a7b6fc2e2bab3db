//! Process lifecycle: open storage, run modules, serve, shut down.

use anyhow::Context;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Open the database for the data set selected by `settings`
pub async fn open_database(settings: &Settings) -> anyhow::Result<Database> {
    let path = settings.database_path();
    Database::open(&path, settings.database.max_connections)
        .await
        .with_context(|| format!("failed to open database at {}", path.display()))
}

/// Registry holding every application module, bound to `db`
pub fn build_registry(db: &Database) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db);
    registry
}

/// Apply pending migrations and exit
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let db = open_database(settings).await?;
    let registry = build_registry(&db);
    let applied = registry.run_migrations(&db).await;
    db.close().await;
    applied
}

/// Run the HTTP service until a shutdown signal arrives
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let db = open_database(&settings).await?;
    let registry = build_registry(&db);
    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    registry.init_modules(&ctx).await?;
    registry.run_migrations(&db).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!(
        modules = registry.module_count(),
        dataset = %settings.dataset(),
        "shelf bootstrap complete"
    );

    let served = shelf_http::start_server(&registry, &settings, shelf_http::shutdown_signal()).await;

    let stopped = registry.stop_modules().await;
    db.close().await;

    served?;
    stopped
}
