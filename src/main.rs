use std::sync::Arc;

use termine::{
    config::{Backend, Config},
    models::{AppState, Clock},
    routes,
    store::{MemoryStore, PgStore, RestStore, Store},
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // fail fast: no credentials, no server
    let cfg = Config::from_env()?;

    let store: Arc<dyn Store> = match &cfg.backend {
        Backend::Rest { url, anon_key } => {
            tracing::info!("Using hosted store at {url}");
            Arc::new(RestStore::new(url, anon_key, cfg.http_timeout_secs)?)
        }
        Backend::Postgres { database_url } => {
            tracing::info!("Using direct Postgres connection");
            Arc::new(PgStore::connect(database_url).await?)
        }
        Backend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState {
        store,
        timezone: cfg.timezone,
        clock: Clock::System,
    };

    // Browser front ends call the API directly.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{} ({})", cfg.bind_addr, cfg.timezone);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
