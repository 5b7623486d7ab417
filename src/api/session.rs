//! Explicit session context: the auth token plus the claims derived from
//! it. Created on login (or restored from the persisted cache), injected
//! into the API client, torn down on logout.

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::form::Id;

/// Tokens are minted with loose padding; accept both padded and unpadded.
const LOOSE_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims carried in the token's first segment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Organization the session is logged into.
    pub at: Id,
    pub nickname: String,
    /// Permission level within the organization.
    pub level: u8,
}

/// One authenticated console session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    claims: Claims,
}

/// Shared, replaceable session slot handed to the API client. The client
/// swaps in a new session when the server issues a refreshed token.
pub type SessionHandle = Arc<RwLock<Option<Session>>>;

impl Session {
    /// Parse a session out of a raw token. The segment before the first
    /// space is loose base64 of a JSON claims object.
    pub fn from_token(token: &str) -> Result<Session> {
        let claims_b64 = token.split(' ').next().unwrap_or_default();
        let claims_json = LOOSE_STANDARD
            .decode(claims_b64)
            .context("token claims segment is not valid base64")?;
        let claims: Claims =
            serde_json::from_slice(&claims_json).context("token claims are not valid JSON")?;
        Ok(Session { token: token.to_string(), claims })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn org_id(&self) -> Id {
        self.claims.at
    }

    pub fn nickname(&self) -> &str {
        &self.claims.nickname
    }

    pub fn level(&self) -> u8 {
        self.claims.level
    }

    /// Fresh handle holding this session.
    pub fn into_handle(self) -> SessionHandle {
        Arc::new(RwLock::new(Some(self)))
    }
}

/// Handle with no active session (not logged in).
pub fn empty_handle() -> SessionHandle {
    Arc::new(RwLock::new(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_for(json: &str) -> String {
        format!("{} sig", LOOSE_STANDARD.encode(json))
    }

    #[test]
    fn parses_claims_from_token() {
        let session = Session::from_token(&token_for(
            r#"{"at":3,"nickname":"部长","level":2}"#,
        ))
        .unwrap();
        assert_eq!(session.org_id(), 3);
        assert_eq!(session.nickname(), "部长");
        assert_eq!(session.level(), 2);
    }

    #[test]
    fn accepts_unpadded_base64() {
        let b64 = LOOSE_STANDARD.encode(r#"{"at":1,"nickname":"n","level":0}"#);
        let session = Session::from_token(b64.trim_end_matches('=')).unwrap();
        assert_eq!(session.org_id(), 1);
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert!(Session::from_token("?not-base64?").is_err());
        assert!(Session::from_token(&format!("{} sig", LOOSE_STANDARD.encode("[1,2]"))).is_err());
    }
}
