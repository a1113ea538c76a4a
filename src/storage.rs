use crate::errors::AppError;
use crate::models::{Coupon, LocalStorage};
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn load_storage(path: &Path) -> LocalStorage {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => LocalStorage { entries },
            Err(err) => {
                error!("failed to parse storage file: {err}");
                LocalStorage::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LocalStorage::default(),
        Err(err) => {
            error!("failed to read storage file: {err}");
            LocalStorage::default()
        }
    }
}

pub async fn persist_storage(path: &Path, storage: &LocalStorage) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(&storage.entries).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

/// A missing or unreadable coupon file yields an empty listing.
pub async fn load_coupons(path: &Path) -> Vec<Coupon> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Vec<Coupon>>(&bytes) {
            Ok(coupons) => {
                info!(count = coupons.len(), "loaded coupons");
                coupons
            }
            Err(err) => {
                error!("failed to parse coupons file: {err}");
                Vec::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(err) => {
            error!("failed to read coupons file: {err}");
            Vec::new()
        }
    }
}
