use crate::client::Credentials;
use crate::models::{Coupon, LocalStorage};
use crate::sync::Synchronizer;
use axum::http::{HeaderMap, header::COOKIE};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub coupons: Arc<Vec<Coupon>>,
    pub storage: Arc<Mutex<LocalStorage>>,
    /// Serialises toggles and removals. Read paths never take it, and
    /// `storage` is never held across a backend call.
    pub toggles: Arc<Mutex<()>>,
    pub sync: Synchronizer,
    pub csrf_cookie_name: String,
}

impl AppState {
    pub fn new(
        data_path: PathBuf,
        coupons: Vec<Coupon>,
        storage: LocalStorage,
        sync: Synchronizer,
        csrf_cookie_name: String,
    ) -> Self {
        Self {
            data_path,
            coupons: Arc::new(coupons),
            storage: Arc::new(Mutex::new(storage)),
            toggles: Arc::new(Mutex::new(())),
            sync,
            csrf_cookie_name,
        }
    }

    pub fn find_coupon(&self, discount_id: &str) -> Option<&Coupon> {
        self.coupons
            .iter()
            .find(|coupon| coupon.discount_id == discount_id)
    }

    pub fn credentials(&self, headers: &HeaderMap) -> Credentials {
        let cookie = headers.get(COOKIE).and_then(|value| value.to_str().ok());
        Credentials::from_cookie_header(cookie, &self.csrf_cookie_name)
    }
}
