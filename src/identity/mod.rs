//! Identity gateway: resolves bearer tokens and email addresses to user
//! profiles via the upstream identity service.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::UserProfile;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The upstream rejected the credential (401/403).
    #[error("Invalid or expired token")]
    InvalidCredential,

    /// The upstream answered but refused the lookup (unknown email, bad input).
    #[error("{0}")]
    Rejected(String),

    /// Transport failure, timeout, 5xx or an unreadable response.
    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Resolve a bearer token to the profile it belongs to.
    async fn resolve_token(&self, token: &str) -> Result<UserProfile, IdentityError>;

    /// Resolve an email address to a profile, for invitations.
    async fn resolve_email(&self, email: &str) -> Result<UserProfile, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: Option<String>,
    message: Option<String>,
}

/// reqwest client for the identity service.
///
/// No caching and no retries; every call goes upstream and is bounded by
/// the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpIdentityGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn upstream_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<UpstreamError>().await {
            Ok(UpstreamError { error: Some(msg), .. }) | Ok(UpstreamError { message: Some(msg), .. }) => msg,
            _ => format!("Identity service responded with {}", status),
        }
    }

    async fn read_profile(response: reqwest::Response) -> Result<UserProfile, IdentityError> {
        response
            .json::<Option<UserProfile>>()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("malformed profile: {}", e)))?
            .ok_or(IdentityError::InvalidCredential)
    }
}

#[async_trait]
impl IdentityGateway for HttpIdentityGateway {
    async fn resolve_token(&self, token: &str) -> Result<UserProfile, IdentityError> {
        let response = self
            .client
            .get(self.url("/api/auth/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Self::read_profile(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Identity service rejected token");
                Err(IdentityError::InvalidCredential)
            }
            status => {
                let message = Self::upstream_message(response).await;
                warn!("Token resolution failed with {}: {}", status, message);
                Err(IdentityError::Unavailable(message))
            }
        }
    }

    async fn resolve_email(&self, email: &str) -> Result<UserProfile, IdentityError> {
        let response = self
            .client
            .post(self.url("/auth/email"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Self::read_profile(response)
                .await
                .map_err(|e| match e {
                    IdentityError::InvalidCredential => IdentityError::Rejected("User not found".to_string()),
                    other => other,
                });
        }

        let message = Self::upstream_message(response).await;
        if status.is_client_error() {
            Err(IdentityError::Rejected(message))
        } else {
            warn!("Email resolution failed with {}: {}", status, message);
            Err(IdentityError::Unavailable(message))
        }
    }
}
