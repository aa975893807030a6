//! bearer-guard gateway binary.
//!
//! Token settings come from the `JWT_*` environment variables (see
//! `JwtConfig::from_env`). Set `DEMO_USER_EMAIL` and `DEMO_USER_PASSWORD` to
//! seed a user for `POST /v1/auth/login`.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bearer_guard_auth::{JwtConfig, TokenFactory};
use bearer_guard_gateway::{create_router, GatewayConfig, GatewayState, InMemoryUserProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bearer_guard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting bearer-guard gateway");

    // Load configuration from environment
    let jwt = JwtConfig::from_env();
    let defaults = GatewayConfig::default();
    let gateway_config = GatewayConfig {
        listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
        missing_token_status: std::env::var("MISSING_TOKEN_STATUS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.missing_token_status),
        ..GatewayConfig::default()
    };

    tracing::info!(
        config = ?jwt,
        listen_addr = %gateway_config.listen_addr,
        missing_token_status = %gateway_config.missing_token_status(),
        "Gateway configuration loaded"
    );

    if jwt.secret.is_none() {
        tracing::warn!("No JWT_SECRET set - every token operation will fail");
    }

    // Seed the demo user
    let users = Arc::new(InMemoryUserProvider::new());
    match (
        std::env::var("DEMO_USER_EMAIL"),
        std::env::var("DEMO_USER_PASSWORD"),
    ) {
        (Ok(email), Ok(password)) => {
            let user = users.register(email, &password);
            tracing::info!(user_id = %user.id, email = %user.email, "Demo user registered");
        }
        _ => tracing::warn!("No DEMO_USER_EMAIL/DEMO_USER_PASSWORD set - login will always fail"),
    }

    let listen_addr = gateway_config.listen_addr.clone();
    let tokens = TokenFactory::from_config(Arc::new(jwt));
    let state = GatewayState::new(users, tokens, gateway_config);

    let app = create_router(state);
    tracing::info!("Router configured");

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
