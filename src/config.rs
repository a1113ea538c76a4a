use crate::errors::ConfigError;
use reqwest::Url;
use std::{env, path::PathBuf, time::Duration};

/// What the synchronizer does when the backend answers 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFallback {
    /// Mutate the local store only and report success.
    Local,
    /// Surface the 401 as a failure.
    Strict,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub data_path: PathBuf,
    pub coupons_path: PathBuf,
    pub backend_url: Url,
    pub csrf_cookie_name: String,
    pub backend_timeout: Option<Duration>,
    pub auth_fallback: AuthFallback,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value.parse::<u16>().map_err(|err| ConfigError::InvalidValue {
                name: "PORT",
                reason: err.to_string(),
            })?,
            None => 8080,
        };

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/storage.json"));
        let coupons_path = lookup("COUPONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/coupons.json"));

        let raw_url = lookup("BACKEND_URL").unwrap_or_else(|| "http://127.0.0.1:8000/".to_string());
        let backend_url = parse_base_url(&raw_url)?;

        let csrf_cookie_name = lookup("CSRF_COOKIE_NAME").unwrap_or_else(|| "csrftoken".to_string());

        let backend_timeout = match lookup("BACKEND_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.parse::<u64>().map_err(|err| ConfigError::InvalidValue {
                    name: "BACKEND_TIMEOUT_SECS",
                    reason: err.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let auth_fallback = match lookup("AUTH_FALLBACK").as_deref() {
            None | Some("local") => AuthFallback::Local,
            Some("strict") => AuthFallback::Strict,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "AUTH_FALLBACK",
                    reason: format!("'{other}' is not 'local' or 'strict'"),
                });
            }
        };

        Ok(Self {
            port,
            data_path,
            coupons_path,
            backend_url,
            csrf_cookie_name,
            backend_timeout,
            auth_fallback,
        })
    }
}

/// Endpoint paths are joined onto the base, so it must end with `/`.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut normalised = raw.trim().to_string();
    if !normalised.ends_with('/') {
        normalised.push('/');
    }
    Url::parse(&normalised).map_err(|err| ConfigError::InvalidValue {
        name: "BACKEND_URL",
        reason: err.to_string(),
    })
}
