pub mod app;
pub mod client;
pub mod config;
pub mod dom;
pub mod errors;
pub mod favorites;
pub mod handlers;
pub mod models;
pub mod render;
pub mod state;
pub mod storage;
pub mod sync;
pub mod ui;

pub use app::router;
pub use client::FavoritesClient;
pub use config::Settings;
pub use state::AppState;
pub use storage::{load_coupons, load_storage};
pub use sync::Synchronizer;
