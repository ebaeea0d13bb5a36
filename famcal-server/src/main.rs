mod backend;
mod config;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use famcal_core::auth::AuthMachine;
use famcal_core::{FamilyCalendar, ProviderRegistry};
use famcal_provider_google::GoogleAdapter;
use famcal_provider_google::app_config::GoogleEndpoints;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::backend::PostgrestClient;
use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load()?;

    let backend = Arc::new(PostgrestClient::new(&config.backend)?);
    let family = FamilyCalendar::new(
        backend.clone(),
        backend,
        providers(&config)?,
        config.sync.clone(),
    );

    let auth = AuthMachine::new();
    // Stays initializing until the app reports its stored session
    auth.begin();
    let state = AppState::new(family, auth);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::app(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind))?;
    tracing::info!("famcal-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn providers(config: &ServerConfig) -> Result<ProviderRegistry> {
    let google = match &config.google {
        Some(credentials) => Some(GoogleAdapter::new(
            credentials.clone(),
            GoogleEndpoints::default(),
        )?),
        None => match GoogleAdapter::from_app_config() {
            Ok(adapter) => Some(adapter),
            Err(e) => {
                tracing::warn!("Google calendars disabled: {}", e);
                None
            }
        },
    };

    let mut registry = ProviderRegistry::new();
    if let Some(adapter) = google {
        registry.register(Arc::new(adapter));
    }
    tracing::info!("Calendar providers: {:?}", registry.tags());
    Ok(registry)
}
