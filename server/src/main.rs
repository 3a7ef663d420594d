use anyhow::Context;

use playgate_server::{config, handlers::AppState, routes};
use playgate_store::{Database, UserRepository, VersionRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Playgate server");

    let config = config::load();
    tracing::info!("Using database at {}", config.store.path.display());

    let db = Database::open(&config.store)
        .await
        .context("failed to open database")?;
    db.init().await.context("database initialization failed")?;

    let state = AppState {
        users: UserRepository::new(db.clone()),
        versions: VersionRepository::new(db),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Server listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
