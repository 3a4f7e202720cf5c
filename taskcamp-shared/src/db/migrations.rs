/// Database migration runner.
///
/// Migrations live in `migrations/` at the crate root and are embedded into
/// the binary by `sqlx::migrate!`, so deployments need no external files.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns the underlying migrate error when a migration fails; already
/// applied migrations are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("running database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!("migration failed: {}", e);
            Err(e)
        }
    }
}
