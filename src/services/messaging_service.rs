// src/services/messaging_service.rs
use async_trait::async_trait;
use thiserror::Error;
use tracing;
use uuid::Uuid;

use crate::models::notification::NotificationEnvelope;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Send request failed: {0}")]
    Request(String),

    #[error("Provider API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse provider response: {0}")]
    ResponseParse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.to_string())
    }
}

/// Single-message send against a token-addressed push provider.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Returns the provider's message identifier.
    async fn send(&self, envelope: &NotificationEnvelope) -> Result<String, ProviderError>;
}

// Mock provider for development without credentials
#[derive(Debug, Default)]
pub struct MockMessagingProvider;

#[async_trait]
impl MessagingProvider for MockMessagingProvider {
    async fn send(&self, envelope: &NotificationEnvelope) -> Result<String, ProviderError> {
        tracing::info!(
            "[MOCK] Would send push (token_len: {}): {} - {} (sound: {}, channel: {})",
            envelope.token.len(),
            envelope.notification.title.as_deref().unwrap_or_default(),
            envelope.notification.body.as_deref().unwrap_or_default(),
            envelope.android.notification.sound,
            envelope.android.notification.channel_id,
        );
        Ok(format!("mock/messages/{}", Uuid::new_v4()))
    }
}
