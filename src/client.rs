use crate::errors::ClientError;
use crate::models::{Direction, FavoriteReply, FavoriteRequest, FavoriteStatusReply};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, warn};

const CSRF_HEADER: &str = "X-CSRFToken";

/// Per-caller credentials forwarded to the backend.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub csrf_token: Option<String>,
    pub cookie: Option<String>,
}

impl Credentials {
    pub fn from_cookie_header(cookie: Option<&str>, csrf_cookie_name: &str) -> Self {
        let csrf_token = cookie.and_then(|header| cookie_value(header, csrf_cookie_name));
        if csrf_token.is_none() {
            debug!("csrf cookie '{csrf_cookie_name}' not present");
        }
        Self {
            csrf_token,
            cookie: cookie.map(str::to_string),
        }
    }
}

pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteAck {
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FavoritesClient {
    client: Client,
    base_url: Url,
}

impl FavoritesClient {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::Url(err.to_string()))
    }

    fn with_credentials(
        request: reqwest::RequestBuilder,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        let mut request = request;
        if let Some(token) = &credentials.csrf_token {
            request = request.header(CSRF_HEADER, token.as_str());
        }
        if let Some(cookie) = &credentials.cookie {
            request = request.header(reqwest::header::COOKIE, cookie.as_str());
        }
        request
    }

    #[tracing::instrument(name = "Update favorite on backend", skip(self, credentials))]
    pub async fn toggle_remote_favorite(
        &self,
        discount_id: &str,
        direction: Direction,
        credentials: &Credentials,
    ) -> Result<FavoriteAck, ClientError> {
        let url = self.endpoint(direction.endpoint())?;
        let request = self
            .client
            .post(url)
            .json(&FavoriteRequest { discount_id });
        let response = Self::with_credentials(request, credentials).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized { body });
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "favorite update failed: {body}");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply = match serde_json::from_str::<FavoriteReply>(&body) {
            Ok(reply) => reply,
            Err(err) => {
                debug!("non-JSON success body: {err}");
                return Ok(FavoriteAck { message: None });
            }
        };
        if reply.status.as_deref() == Some("error") {
            return Err(ClientError::Rejected(
                reply.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(FavoriteAck {
            message: reply.message,
        })
    }

    #[tracing::instrument(name = "Check favorite on backend", skip(self, credentials))]
    pub async fn check_favorite(
        &self,
        discount_id: &str,
        credentials: &Credentials,
    ) -> Result<bool, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Url(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push("check_favorite")
            .push(discount_id)
            .push("");
        let response = Self::with_credentials(self.client.get(url), credentials)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let reply: FavoriteStatusReply = response.json().await?;
        Ok(reply.is_favorite)
    }
}
