use coupon_board::{
    AppState, FavoritesClient, Settings, Synchronizer, load_coupons, load_storage, router,
};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings = Settings::from_env()?;
    if let Some(parent) = settings.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let storage = load_storage(&settings.data_path).await;
    let coupons = load_coupons(&settings.coupons_path).await;
    let client = FavoritesClient::new(settings.backend_url.clone(), settings.backend_timeout)?;
    let sync = Synchronizer::new(client, settings.auth_fallback);
    let state = AppState::new(
        settings.data_path,
        coupons,
        storage,
        sync,
        settings.csrf_cookie_name,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!(backend = %settings.backend_url, "listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
