// src/state.rs
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    errors::{GatewayError, GatewayResult},
    models::notification::{ChannelConfig, DEFAULT_CALL_CHANNEL, DEFAULT_CHAT_CHANNEL},
    services::{
        dispatcher::NotificationDispatcher,
        fcm_client::{AccessTokenSource, DEFAULT_FCM_BASE_URL, FcmClient, FcmConfig, ServiceAccountKey},
        messaging_service::{MessagingProvider, MockMessagingProvider},
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_FCM_TIMEOUT_SECS: u64 = 10;

pub struct AppState {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub config: AppConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct FcmSettings {
    pub config: FcmConfig,
    pub credentials: AccessTokenSource,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub fcm: Option<FcmSettings>,
    pub channels: ChannelConfig,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> GatewayResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> GatewayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| GatewayError::invalid_configuration("BIND_ADDR", format!("{}", e)))?;

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(GatewayError::invalid_configuration(
                    "LOG_FORMAT",
                    format!("expected 'text' or 'json', got '{}'", other),
                ));
            }
        };

        let channels = ChannelConfig {
            chat_channel_id: var("CHAT_CHANNEL_ID").unwrap_or_else(|| DEFAULT_CHAT_CHANNEL.to_string()),
            call_channel_id: var("CALL_CHANNEL_ID").unwrap_or_else(|| DEFAULT_CALL_CHANNEL.to_string()),
        };

        let timeout_secs = match var("FCM_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                GatewayError::invalid_configuration("FCM_TIMEOUT_SECS", format!("{}", e))
            })?,
            None => DEFAULT_FCM_TIMEOUT_SECS,
        };
        let base_url = var("FCM_BASE_URL").unwrap_or_else(|| DEFAULT_FCM_BASE_URL.to_string());
        let project_override = var("FCM_PROJECT_ID");

        let service_account = match var("FCM_SERVICE_ACCOUNT_JSON") {
            Some(raw) => Some(parse_service_account("FCM_SERVICE_ACCOUNT_JSON", &raw)?),
            None => match var("FCM_SERVICE_ACCOUNT_PATH").or_else(|| var("GOOGLE_APPLICATION_CREDENTIALS")) {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path).map_err(|e| {
                        GatewayError::configuration(format!(
                            "Cannot read service account file {}: {}",
                            path, e
                        ))
                    })?;
                    Some(parse_service_account("FCM_SERVICE_ACCOUNT_PATH", &raw)?)
                }
                None => None,
            },
        };

        let fcm = match (var("FCM_ACCESS_TOKEN"), service_account) {
            (Some(token), _) => {
                let project_id = project_override.ok_or_else(|| {
                    GatewayError::configuration("FCM_ACCESS_TOKEN requires FCM_PROJECT_ID")
                })?;
                Some((project_id, AccessTokenSource::Static(token)))
            }
            (None, Some(key)) => {
                let project_id = project_override.unwrap_or_else(|| key.project_id.clone());
                Some((project_id, AccessTokenSource::ServiceAccount(Arc::new(key))))
            }
            (None, None) => None,
        }
        .map(|(project_id, credentials)| FcmSettings {
            config: FcmConfig {
                project_id,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            credentials,
        });

        Ok(Self {
            bind_addr,
            fcm,
            channels,
            log_format,
        })
    }
}

fn parse_service_account(source: &str, raw: &str) -> GatewayResult<ServiceAccountKey> {
    serde_json::from_str(raw)
        .map_err(|e| GatewayError::invalid_configuration(source, format!("malformed service account: {}", e)))
}

impl AppState {
    pub fn new(config: AppConfig) -> GatewayResult<Self> {
        let provider: Arc<dyn MessagingProvider> = match &config.fcm {
            Some(settings) => {
                tracing::info!(project_id = %settings.config.project_id, "Using FCM messaging provider");
                let client = FcmClient::new(settings.config.clone(), settings.credentials.clone())
                    .map_err(|e| GatewayError::configuration(e.to_string()))?;
                Arc::new(client)
            }
            None => {
                tracing::warn!("FCM credentials not set, using mock messaging provider");
                Arc::new(MockMessagingProvider)
            }
        };

        Ok(Self::with_provider(provider, config))
    }

    /// Builds state around an already constructed provider.
    pub fn with_provider(provider: Arc<dyn MessagingProvider>, config: AppConfig) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(provider, config.channels.clone()));
        Self { dispatcher, config }
    }
}
