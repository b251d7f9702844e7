use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_centros::api::router;
use portal_centros::state::AppState;
use portal_centros::supabase::{SupabaseConfig, SupabaseHttpClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "portal_centros=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SupabaseConfig::new_from_env()?;
    let supabase = Arc::new(SupabaseHttpClient::new(config)?);

    let state = AppState::new(supabase);
    let app = router(state);

    let puerto: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], puerto));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
