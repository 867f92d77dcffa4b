// src/services/fcm_client.rs
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing;

use crate::{
    models::notification::NotificationEnvelope,
    services::messaging_service::{MessagingProvider, ProviderError},
};

pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
// Refresh this many seconds before the provider-reported expiry
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Firebase service account key file.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &REDACTED)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Where bearer tokens for the send call come from.
#[derive(Clone)]
pub enum AccessTokenSource {
    ServiceAccount(Arc<ServiceAccountKey>),
    /// Fixed token, e.g. for an emulator.
    Static(String),
}

impl fmt::Debug for AccessTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTokenSource::ServiceAccount(key) => {
                f.debug_tuple("ServiceAccount").field(key).finish()
            }
            AccessTokenSource::Static(_) => f.debug_tuple("Static").field(&REDACTED).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    pub base_url: String,
    pub timeout: std::time::Duration,
}

impl FcmConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            base_url: DEFAULT_FCM_BASE_URL.to_string(),
            timeout: std::time::Duration::from_secs(10),
        }
    }

    pub fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

#[derive(Debug, Clone)]
struct TokenCache {
    access_token: String,
    expires_at: i64,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Serialize)]
struct FcmSendRequest<'a> {
    message: &'a NotificationEnvelope,
}

#[derive(Debug, Deserialize)]
struct FcmSendResponse {
    name: String,
}

/// FCM HTTP v1 client, shared process-wide behind an `Arc`.
pub struct FcmClient {
    config: FcmConfig,
    credentials: AccessTokenSource,
    token_cache: Mutex<Option<TokenCache>>,
    http_client: reqwest::Client,
}

impl FcmClient {
    pub fn new(config: FcmConfig, credentials: AccessTokenSource) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config,
            credentials,
            token_cache: Mutex::new(None),
            http_client,
        })
    }

    /// Bearer token for the send call, cached until shortly before expiry.
    pub async fn access_token(&self) -> Result<String, ProviderError> {
        let key = match &self.credentials {
            AccessTokenSource::Static(token) => return Ok(token.clone()),
            AccessTokenSource::ServiceAccount(key) => key,
        };

        let mut cache = self.token_cache.lock().await;
        let now = Utc::now().timestamp();
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > now + TOKEN_EXPIRY_MARGIN_SECS {
                return Ok(cached.access_token.clone());
            }
        }

        tracing::debug!(client_email = %key.client_email, "Requesting FCM access token");
        let fresh = self.fetch_access_token(key).await?;
        let access_token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_access_token(&self, key: &ServiceAccountKey) -> Result<TokenCache, ProviderError> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: &key.client_email,
            sub: &key.client_email,
            scope: FCM_SCOPE,
            aud: &key.token_uri,
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| ProviderError::Auth(format!("Failed to parse private key: {}", e)))?;

        let mut header = Header::new(Algorithm::RS256);
        if !key.private_key_id.is_empty() {
            header.kid = Some(key.private_key_id.clone());
        }

        let assertion = encode(&header, &claims, &encoding_key)
            .map_err(|e| ProviderError::Auth(format!("Failed to encode JWT: {}", e)))?;

        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Auth(format!("Failed to get access token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "Token request failed with status {}: {}",
                status, body
            )));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("Failed to parse token response: {}", e)))?;

        Ok(TokenCache {
            access_token: token_response.access_token,
            expires_at: Utc::now().timestamp() + token_response.expires_in,
        })
    }
}

#[async_trait]
impl MessagingProvider for FcmClient {
    async fn send(&self, envelope: &NotificationEnvelope) -> Result<String, ProviderError> {
        let access_token = self.access_token().await?;

        let response = self
            .http_client
            .post(self.config.send_url())
            .bearer_auth(access_token)
            .json(&FcmSendRequest { message: envelope })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let sent: FcmSendResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParse(e.to_string()))?;

        tracing::debug!(message_name = %sent.name, "FCM accepted message");
        Ok(sent.name)
    }
}
