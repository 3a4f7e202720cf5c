//! # taskcamp API server
//!
//! Project-management API: accounts with verified-email sessions,
//! role-guarded projects, tasks, subtasks, and notes.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskcamp-api
//! ```

use taskcamp_api::app::{build_router, AppState};
use taskcamp_api::config::Config;
use taskcamp_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskcamp_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "taskcamp API server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(db, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
