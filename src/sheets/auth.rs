// src/sheets/auth.rs
// Service-account OAuth: sign an RS256 assertion, trade it for a bearer token.

use std::fs;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::consts::{SHEETS_SCOPES, TOKEN_URI};
use crate::config::options::Credentials;
use crate::errors::{RelayError, Result};

const SOURCE_ID: &str = "google-auth";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Clone, Debug, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String { s!(TOKEN_URI) }

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| RelayError::source_unavailable(SOURCE_ID, format!("bad service-account JSON: {e}")))
    }

    pub fn from_credentials(creds: &Credentials) -> Result<Self> {
        match creds {
            Credentials::Inline(json) => Self::from_json(json),
            Credentials::File(path) => {
                let json = fs::read_to_string(path).map_err(|e| {
                    RelayError::source_unavailable(SOURCE_ID, format!("{}: {e}", path.display()))
                })?;
                Self::from_json(&json)
            }
        }
    }

    /// Signed JWT assertion valid for one hour from `now` (unix seconds).
    pub fn assertion(&self, now: i64) -> Result<String> {
        let claims = Claims {
            iss: &self.client_email,
            scope: SHEETS_SCOPES,
            aud: &self.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| RelayError::source_unavailable(SOURCE_ID, format!("bad private key: {e}")))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| RelayError::source_unavailable(SOURCE_ID, format!("signing assertion: {e}")))
    }

    pub fn fetch_access_token(&self, http: &Client) -> Result<String> {
        let assertion = self.assertion(Utc::now().timestamp())?;
        let resp = http
            .post(&self.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| RelayError::source_unavailable(SOURCE_ID, e))?;
        let token: TokenResponse = resp.json().map_err(|e| RelayError::source_unavailable(SOURCE_ID, e))?;
        info!(service_account = %self.client_email, "authorized with Google");
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_and_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"type":"service_account","client_email":"bot@x.iam.gserviceaccount.com","private_key":"pem"}"#,
        )
        .unwrap();
        assert_eq!(key.client_email, "bot@x.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, TOKEN_URI);
    }

    #[test]
    fn malformed_credentials_are_source_unavailable() {
        let err = ServiceAccountKey::from_json("{").unwrap_err();
        assert!(matches!(err, RelayError::SourceUnavailable { .. }));
        let err = ServiceAccountKey::from_credentials(&Credentials::File("/definitely/missing.json".into()))
            .unwrap_err();
        assert!(matches!(err, RelayError::SourceUnavailable { .. }));
    }

    #[test]
    fn bad_private_key_cannot_sign() {
        let key = ServiceAccountKey {
            client_email: s!("bot@x"),
            private_key: s!("not a pem"),
            token_uri: s!(TOKEN_URI),
        };
        assert!(matches!(key.assertion(1_700_000_000), Err(RelayError::SourceUnavailable { .. })));
    }
}
