use std::sync::Arc;

use pageguard::config::GatewayConfig;
use pageguard::identity::HttpIdentityProvider;
use pageguard::{routes, state};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env().expect("invalid gateway configuration");
    let table = config.guard_table().expect("guard table load failed");
    let identity = HttpIdentityProvider::new(config.identity_url.clone(), config.identity_timeouts)
        .expect("identity client init failed");

    tracing::info!(
        routes = table.routes.len(),
        identity_url = %config.identity_url,
        on_failure = ?config.on_failure,
        "guard table loaded"
    );

    let state = state::AppState::new(table, Arc::new(identity), config.on_failure);
    let app = routes::app(state, &config.static_dir);

    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, static_dir = %config.static_dir.display(), "pageguard listening");
    axum::serve(listener, app).await.expect("server failed");
}
