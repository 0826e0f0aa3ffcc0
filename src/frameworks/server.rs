// Framework bootstrap for the game server runtime.

use crate::frameworks::config;
use crate::interface_adapters::clients::auth::AuthClient;
use crate::interface_adapters::clients::identity::HttpIdentityProvider;
use crate::interface_adapters::clients::token_store::InMemoryTokenStore;
use crate::interface_adapters::clients::user_store::UserStoreClient;
use crate::interface_adapters::net::{create_lobby_handler, list_lobbies_handler, lobby_stats_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::LobbyRegistry;
use crate::use_cases::join_policy::CachedIdentityProvider;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).json().with_current_span(true).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state().await?;
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/lobbies", post(create_lobby_handler).get(list_lobbies_handler))
        .route("/lobbies/stats", get(lobby_stats_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address).await.inspect_err(|e| {
        tracing::error!(%address, error = %e, "failed to bind");
    })?;

    run(listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let auth_base_url = config::auth_service_url();
    let auth_verify_timeout = config::auth_verify_timeout();
    let auth_client = AuthClient::new(auth_base_url.clone(), auth_verify_timeout)
        .map_err(|e| std::io::Error::other(format!("failed to initialize auth client: {e}")))?;
    tracing::debug!(auth_base_url = %auth_base_url, auth_verify_timeout_ms = auth_verify_timeout.as_millis(), "auth client configured");

    let identity_base_url = config::identity_provider_url();
    let identity_timeout = config::identity_provider_timeout();
    let tokens = Arc::new(InMemoryTokenStore::new());
    let identity_provider = HttpIdentityProvider::new(identity_base_url.clone(), identity_timeout, tokens)
        .map_err(|e| std::io::Error::other(format!("failed to initialize identity provider client: {e}")))?;
    tracing::debug!(identity_base_url = %identity_base_url, "identity provider client configured");

    let user_store_url = config::user_store_url();
    let user_store = UserStoreClient::new(user_store_url.clone(), config::user_store_timeout())
        .map_err(|e| std::io::Error::other(format!("failed to initialize user store client: {e}")))?;
    tracing::debug!(user_store_url = %user_store_url, "user store client configured");

    let lobby_registry = Arc::new(LobbyRegistry::new());

    Ok(Arc::new(AppState {
        lobby_registry,
        auth_client: Arc::new(auth_client),
        identity_provider: Arc::new(CachedIdentityProvider::new(identity_provider)),
        user_store: Arc::new(user_store),
    }))
}
