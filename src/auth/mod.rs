//! OAuth client-credentials exchange against the account OIDC endpoint.
//!
//! A service principal's client id and secret are traded for a bearer token
//! once per run. The token is never refreshed.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

const GRANT_TYPE: &str = "client_credentials";
const SCOPE: &str = "all-apis";

/// Bearer token used by every API client.
#[derive(Clone, Eq, PartialEq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Service principal credentials.
#[derive(Clone, Eq, PartialEq)]
pub struct ClientCredentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl ClientCredentials {
    /// Constructs credentials, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when either value is blank.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let trimmed_id = client_id.into().trim().to_owned();
        let trimmed_secret = client_secret.into().trim().to_owned();
        if trimmed_id.is_empty() {
            return Err(AuthError::InvalidCredentials {
                field: String::from("client_id"),
            });
        }
        if trimmed_secret.is_empty() {
            return Err(AuthError::InvalidCredentials {
                field: String::from("client_secret"),
            });
        }
        Ok(Self {
            client_id: trimmed_id,
            client_secret: trimmed_secret,
        })
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Errors raised while obtaining a token.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AuthError {
    /// Raised when a credential is blank.
    #[error("missing {field}")]
    InvalidCredentials {
        /// Name of the blank field.
        field: String,
    },
    /// Raised when the token endpoint answers with a non-200 status.
    #[error("token request rejected with status {status}: {body}")]
    TokenRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },
    /// Raised when a 200 response carries no `access_token`.
    #[error("access token not found in the response")]
    MissingAccessToken,
    /// Raised when a 200 response is not JSON.
    #[error("failed to decode token response: {message}")]
    Decode {
        /// Parser error message.
        message: String,
    },
    /// Raised when the request never completes.
    #[error("token request failed: {message}")]
    Transport {
        /// Transport error message.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Builds the OIDC token URL for an account.
#[must_use]
pub fn token_endpoint(accounts_host: &str, account_id: &str) -> String {
    format!(
        "{}/oidc/accounts/{account_id}/v1/token",
        accounts_host.trim_end_matches('/')
    )
}

/// Exchanges client credentials for an access token.
///
/// # Errors
///
/// Returns [`AuthError`] when the endpoint is unreachable, rejects the
/// credentials, or answers without a token.
pub async fn fetch_token(
    http: &reqwest::Client,
    accounts_host: &str,
    account_id: &str,
    credentials: &ClientCredentials,
) -> Result<AccessToken, AuthError> {
    let url = token_endpoint(accounts_host, account_id);
    let response = http
        .post(&url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", GRANT_TYPE), ("scope", SCOPE)])
        .send()
        .await
        .map_err(|err| AuthError::Transport {
            message: err.to_string(),
        })?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|err| AuthError::Transport {
        message: err.to_string(),
    })?;
    interpret_token_response(status, &body)
}

/// Turns a token endpoint status and body into a token or a typed error.
///
/// # Errors
///
/// Returns [`AuthError::TokenRejected`] for any status other than 200,
/// [`AuthError::Decode`] for a non-JSON body and
/// [`AuthError::MissingAccessToken`] when the field is absent.
pub fn interpret_token_response(status: u16, body: &str) -> Result<AccessToken, AuthError> {
    if status != 200 {
        error!("Failed to retrieve token. Status code: {status}");
        error!("Response: {body}");
        return Err(AuthError::TokenRejected {
            status,
            body: body.to_owned(),
        });
    }

    let parsed: TokenResponse = serde_json::from_str(body).map_err(|err| AuthError::Decode {
        message: err.to_string(),
    })?;
    match parsed.access_token {
        Some(token) if !token.is_empty() => {
            info!("Access Token Retrieved");
            Ok(AccessToken(token))
        }
        _ => {
            warn!("Access token not found in the response.");
            Err(AuthError::MissingAccessToken)
        }
    }
}
