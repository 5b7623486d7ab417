//! Login against the backend's credential endpoint. Credential
//! verification itself is the server's job; we submit, read back the
//! issued token, and build the session from it.

use anyhow::Result;
use log::debug;
use reqwest::Client;
use serde_json::json;

use super::client::REFRESH_TOKEN_HEADER;
use super::session::Session;

pub struct AuthClient {
    client: Client,
    login_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Self {
        Self { client: Client::new(), login_url: format!("{}/login", base_url) }
    }

    /// Exchange credentials for a session. The issued token arrives in
    /// the same header the server later uses for refreshes.
    pub async fn login(&self, account: &str, password: &str) -> Result<Session> {
        debug!("Attempting login for account {}", account);

        let response = self
            .client
            .post(&self.login_url)
            .json(&json!({ "account": account, "password": password }))
            .send()
            .await?;

        debug!("Login request status: {}", response.status());

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Login failed: {}", error_text);
        }

        let token = response
            .headers()
            .get(REFRESH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow::anyhow!("Login response carried no token"))?;

        Session::from_token(token)
    }
}
