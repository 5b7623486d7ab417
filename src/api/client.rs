//! HTTP client for the Rop backend with connection pooling. Attaches the
//! session token to every request and captures server-issued token
//! refreshes from the response headers.

use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::session::{Session, SessionHandle};

/// Request header carrying the session token.
pub const TOKEN_HEADER: &str = "rop-token";
/// Response header carrying a server-issued replacement token.
pub const REFRESH_TOKEN_HEADER: &str = "rop-refresh-token";
/// Fallback API base when neither config nor environment specify one.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";

#[derive(Clone)]
pub struct RopClient {
    base_url: String,
    http_client: reqwest::Client,
    session: SessionHandle,
}

impl RopClient {
    pub fn new(base_url: String, session: SessionHandle) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rop-console/0.1")
            .build()
            .expect("Failed to build HTTP client");

        Self { base_url, http_client, session }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    /// Current session's organization id; errors when not logged in.
    pub async fn org_id(&self) -> Result<crate::form::Id> {
        self.session
            .read()
            .await
            .as_ref()
            .map(Session::org_id)
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run 'rop-console auth login' first."))
    }

    /// GET a JSON payload.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let request = self.http_client.get(format!("{}{}", self.base_url, path)).query(params);
        let response = self.dispatch(request).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, expecting a JSON payload back.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let request = self.http_client.post(format!("{}{}", self.base_url, path)).json(body);
        let response = self.dispatch(request).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, discarding any response payload.
    pub async fn post(&self, path: &str, body: &impl Serialize) -> Result<()> {
        let request = self.http_client.post(format!("{}{}", self.base_url, path)).json(body);
        self.dispatch(request).await?;
        Ok(())
    }

    /// Attach the token, send, capture a refreshed token if the server
    /// issued one, and turn non-success statuses into errors.
    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = match self.session.read().await.as_ref() {
            Some(session) => request.header(TOKEN_HEADER, session.token()),
            None => request,
        };
        let response = request.send().await?;

        if let Some(value) = response.headers().get(REFRESH_TOKEN_HEADER) {
            match value.to_str().map_err(anyhow::Error::from).and_then(|t| Session::from_token(t)) {
                Ok(refreshed) => {
                    debug!("Server refreshed the session token");
                    *self.session.write().await = Some(refreshed);
                }
                Err(e) => warn!("Ignoring malformed refresh token: {}", e),
            }
        }

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Request failed with status {}: {}", status, error_text)
        }
    }
}
