//! The contract between the shelf process and the feature modules it hosts.

use async_trait::async_trait;
use axum::Router;
use shelf_db::Database;

/// What a module sees at startup: resolved settings and the open database.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    pub db: &'a Database,
}

/// A schema change owned by one module, applied at most once.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Ordering key within the module, e.g. `001_create_books`
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature hosted by the shelf process.
///
/// Modules are registered once, at startup, before the database is migrated.
/// Lifecycle: `init` for every module, then all migrations, then `start`.
/// `stop` runs in reverse registration order during shutdown.
#[async_trait]
pub trait Module: Sync + Send {
    /// Registry key; also names the module's rows in `_migrations`
    fn name(&self) -> &'static str;

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes with their full paths (`/books`, not a prefix-relative path).
    /// They are merged into the root router unchanged and share its 404/405
    /// handling and middleware.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with `paths` and `components.schemas`, merged into
    /// `/docs/openapi.json`
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Applied sorted by module name then `Migration::id`, each in its own
    /// transaction
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
