// src/services/mod.rs
pub mod dispatcher;
pub mod fcm_client;
pub mod messaging_service;

pub use dispatcher::{DispatchError, NotificationDispatcher};
pub use fcm_client::{AccessTokenSource, FcmClient, FcmConfig, ServiceAccountKey};
pub use messaging_service::{MessagingProvider, MockMessagingProvider, ProviderError};
