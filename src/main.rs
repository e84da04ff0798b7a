use accounting_portal::{
    config::{get_config, init_config, ApiMode},
    middleware::cors::cors_layer,
    routes, AppState,
};
use axum::extract::DefaultBodyLimit;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config()?;

    let app_state = AppState::new(config.clone())?;
    match config.api_mode() {
        ApiMode::Live => info!(
            api = config.api_base_url.as_deref().unwrap_or_default(),
            "Live mode: reading from the remote API"
        ),
        ApiMode::Demo => info!(
            store = ?config.demo_store_path,
            "Demo mode: reading from the local store"
        ),
    }

    info!("Serving uploads from: {}", config.uploads_dir.display());

    let app = routes::router(app_state)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(&config.uploads_dir),
        )
        .layer(cors_layer(config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
