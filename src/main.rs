use anyhow::{Context, Result};
use axum::{extract::FromRef, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{api_client::ApiClient, config::Settings, inflight::InFlight};

// Declare modules
mod api_client;
mod config;
mod error;
mod filter;
mod format;
mod forms;
mod inflight;
mod models;
mod presenter;
mod routes;
mod session;
mod views;

// Shared by every handler; each field is also extractable on its own via State<...>
#[derive(Clone, FromRef)]
pub struct AppState {
    settings: Arc<Settings>,
    api: Arc<ApiClient>,
    verifications: Arc<InFlight>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let api = ApiClient::new(&settings)?;
        Ok(AppState {
            settings: Arc::new(settings),
            api: Arc::new(api),
            verifications: Arc::new(InFlight::default()),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "vehicle_market=info,tower_http=info".into()))
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing vehicle marketplace front end...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let app_state = AppState::new(settings).context("Failed to initialize application state")?;
    tracing::info!("Listings backend at {}", app_state.api.base_url());

    let app: Router = routes::create_router(app_state.clone())
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = app_state.settings.server_address.parse().with_context(|| {
        format!("Invalid server address format: {}", app_state.settings.server_address)
    })?;

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
