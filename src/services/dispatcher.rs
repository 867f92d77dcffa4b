// src/services/dispatcher.rs
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing;

use crate::{
    models::notification::{
        ANDROID_RINGTONE_SOUND, APNS_RINGTONE_SOUND, AndroidConfig, AndroidNotification,
        ApnsConfig, ApnsPayload, Aps, ChannelConfig, DEFAULT_SOUND, DispatchSuccess,
        NotificationContent, NotificationEnvelope, NotificationRequest,
    },
    services::messaging_service::MessagingProvider,
};

pub const SEND_FAILED_MESSAGE: &str = "Failed to send notification";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Provider detail is logged, never carried here.
    #[error("{}", SEND_FAILED_MESSAGE)]
    Internal,
}

/// Reshapes push requests into provider envelopes and sends them.
pub struct NotificationDispatcher {
    provider: Arc<dyn MessagingProvider>,
    channels: ChannelConfig,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn MessagingProvider>, channels: ChannelConfig) -> Self {
        Self { provider, channels }
    }

    pub fn channels(&self) -> &ChannelConfig {
        &self.channels
    }

    /// Sends one message; exactly one provider call, no retries.
    pub async fn dispatch(
        &self,
        request: NotificationRequest,
    ) -> Result<DispatchSuccess, DispatchError> {
        let envelope = build_envelope(&request, &self.channels);

        tracing::info!(
            notification_type = %request.notification_type,
            chat_id = %request.chat_id,
            token_len = envelope.token.len(),
            "Dispatching push notification"
        );

        match self.provider.send(&envelope).await {
            Ok(message_id) => {
                tracing::debug!(%message_id, "Push notification sent");
                Ok(DispatchSuccess::new())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error sending notification");
                Err(DispatchError::Internal)
            }
        }
    }
}

/// Pure request-to-envelope mapping.
pub fn build_envelope(
    request: &NotificationRequest,
    channels: &ChannelConfig,
) -> NotificationEnvelope {
    let mut data = BTreeMap::new();
    data.insert("type".to_string(), request.notification_type.clone());
    data.insert("senderId".to_string(), request.sender_id.clone());
    data.insert("senderName".to_string(), request.sender_name.clone());
    data.insert("chatId".to_string(), request.chat_id.clone());
    data.insert("callId".to_string(), request.call_id.clone());
    data.insert(
        "callType".to_string(),
        request.call_type.clone().unwrap_or_default(),
    );
    data.insert(
        "senderEmail".to_string(),
        request.sender_email.clone().unwrap_or_default(),
    );
    data.insert(
        "senderImage".to_string(),
        request.sender_image.clone().unwrap_or_default(),
    );

    // extraData wins on collision
    if let Some(extra) = &request.extra_data {
        for (key, value) in extra {
            data.insert(key.clone(), value.clone());
        }
    }

    let (android_sound, channel_id, apns_sound) = if request.is_call() {
        (
            ANDROID_RINGTONE_SOUND,
            channels.call_channel_id.as_str(),
            APNS_RINGTONE_SOUND,
        )
    } else {
        (
            DEFAULT_SOUND,
            channels.chat_channel_id.as_str(),
            DEFAULT_SOUND,
        )
    };

    NotificationEnvelope {
        token: request.target_token.clone(),
        notification: NotificationContent {
            title: request.title.clone(),
            body: request.body.clone(),
        },
        data,
        android: AndroidConfig {
            notification: AndroidNotification {
                sound: android_sound.to_string(),
                channel_id: channel_id.to_string(),
            },
        },
        apns: ApnsConfig {
            payload: ApnsPayload {
                aps: Aps {
                    sound: apns_sound.to_string(),
                },
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::messaging_service::ProviderError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        sent: Mutex<Vec<NotificationEnvelope>>,
    }

    #[async_trait]
    impl MessagingProvider for RecordingProvider {
        async fn send(&self, envelope: &NotificationEnvelope) -> Result<String, ProviderError> {
            self.sent.lock().unwrap().push(envelope.clone());
            Ok("projects/test/messages/1".to_string())
        }
    }

    struct FailingProvider {
        error: fn() -> ProviderError,
        calls: Mutex<usize>,
    }

    impl FailingProvider {
        fn new(error: fn() -> ProviderError) -> Self {
            Self {
                error,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl MessagingProvider for FailingProvider {
        async fn send(&self, _envelope: &NotificationEnvelope) -> Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            Err((self.error)())
        }
    }

    fn request(notification_type: &str) -> NotificationRequest {
        NotificationRequest {
            target_token: "device-token".to_string(),
            title: Some("Kofi".to_string()),
            body: Some("Are you free?".to_string()),
            notification_type: notification_type.to_string(),
            sender_id: "user-1".to_string(),
            sender_name: "Kofi".to_string(),
            sender_email: None,
            sender_image: None,
            chat_id: "chat-9".to_string(),
            call_id: "call-3".to_string(),
            call_type: None,
            extra_data: None,
        }
    }

    #[test]
    fn test_chat_message_uses_default_sound_and_chat_channel() {
        for notification_type in ["message", "image", "CALL", ""] {
            let envelope = build_envelope(&request(notification_type), &ChannelConfig::default());
            assert_eq!(envelope.android.notification.sound, "default");
            assert_eq!(envelope.android.notification.channel_id, "chat_channel_v1");
            assert_eq!(envelope.apns.payload.aps.sound, "default");
        }
    }

    #[test]
    fn test_call_uses_ringtone_and_call_channel() {
        let envelope = build_envelope(&request("call"), &ChannelConfig::default());
        assert_eq!(envelope.android.notification.sound, "ringtone");
        assert_eq!(envelope.android.notification.channel_id, "call_channel_v1");
        assert_eq!(envelope.apns.payload.aps.sound, "ringtone.caf");
    }

    #[test]
    fn test_configured_channels_are_used() {
        let channels = ChannelConfig {
            chat_channel_id: "chats".to_string(),
            call_channel_id: "calls".to_string(),
        };
        assert_eq!(
            build_envelope(&request("call"), &channels).android.notification.channel_id,
            "calls"
        );
        assert_eq!(
            build_envelope(&request("message"), &channels).android.notification.channel_id,
            "chats"
        );
    }

    #[test]
    fn test_missing_optionals_become_empty_strings() {
        let envelope = build_envelope(&request("message"), &ChannelConfig::default());
        assert_eq!(envelope.data["senderEmail"], "");
        assert_eq!(envelope.data["senderImage"], "");
        assert_eq!(envelope.data["callType"], "");
        assert_eq!(envelope.data.len(), 8);
    }

    #[test]
    fn test_data_block_copies_metadata() {
        let mut req = request("call");
        req.sender_email = Some("kofi@example.com".to_string());
        req.sender_image = Some("https://cdn.example.com/k.png".to_string());
        req.call_type = Some("video".to_string());

        let envelope = build_envelope(&req, &ChannelConfig::default());
        assert_eq!(envelope.token, "device-token");
        assert_eq!(envelope.notification.title.as_deref(), Some("Kofi"));
        assert_eq!(envelope.notification.body.as_deref(), Some("Are you free?"));
        assert_eq!(envelope.data["type"], "call");
        assert_eq!(envelope.data["senderId"], "user-1");
        assert_eq!(envelope.data["senderName"], "Kofi");
        assert_eq!(envelope.data["chatId"], "chat-9");
        assert_eq!(envelope.data["callId"], "call-3");
        assert_eq!(envelope.data["callType"], "video");
        assert_eq!(envelope.data["senderEmail"], "kofi@example.com");
        assert_eq!(envelope.data["senderImage"], "https://cdn.example.com/k.png");
    }

    #[test]
    fn test_extra_data_merged_and_wins_on_collision() {
        let mut req = request("message");
        req.extra_data = Some(HashMap::from([
            ("messageId".to_string(), "m-42".to_string()),
            ("senderName".to_string(), "Override".to_string()),
            ("callType".to_string(), "audio".to_string()),
        ]));

        let envelope = build_envelope(&req, &ChannelConfig::default());
        assert_eq!(envelope.data["messageId"], "m-42");
        assert_eq!(envelope.data["senderName"], "Override");
        assert_eq!(envelope.data["callType"], "audio");
        assert_eq!(envelope.data.len(), 9);
    }

    #[test]
    fn test_extra_data_type_does_not_change_sound() {
        let mut req = request("message");
        req.extra_data = Some(HashMap::from([("type".to_string(), "call".to_string())]));

        let envelope = build_envelope(&req, &ChannelConfig::default());
        assert_eq!(envelope.data["type"], "call");
        assert_eq!(envelope.android.notification.sound, "default");
    }

    #[test]
    fn test_missing_title_and_body_are_left_out() {
        let mut req = request("message");
        req.title = None;
        req.body = None;

        let envelope = build_envelope(&req, &ChannelConfig::default());
        assert_eq!(envelope.notification.title, None);
        assert_eq!(envelope.notification.body, None);
        assert_eq!(envelope.data["senderId"], "user-1");
    }

    #[test]
    fn test_empty_token_is_passed_through() {
        let mut req = request("message");
        req.target_token = String::new();
        assert_eq!(build_envelope(&req, &ChannelConfig::default()).token, "");
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let provider = Arc::new(RecordingProvider::default());
        let dispatcher = NotificationDispatcher::new(provider.clone(), ChannelConfig::default());

        let result = dispatcher.dispatch(request("call")).await;
        assert_eq!(result, Ok(DispatchSuccess { success: true }));

        let sent = provider.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], build_envelope(&request("call"), &ChannelConfig::default()));
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_uniform() {
        let failures: [fn() -> ProviderError; 4] = [
            || ProviderError::Api {
                status: 400,
                body: "INVALID_ARGUMENT".to_string(),
            },
            || ProviderError::Request("connection reset".to_string()),
            || ProviderError::Auth("invalid_grant".to_string()),
            || ProviderError::Api {
                status: 429,
                body: "QUOTA_EXCEEDED".to_string(),
            },
        ];

        for failure in failures {
            let provider = Arc::new(FailingProvider::new(failure));
            let dispatcher = NotificationDispatcher::new(provider.clone(), ChannelConfig::default());

            let err = dispatcher.dispatch(request("message")).await.unwrap_err();
            assert_eq!(err, DispatchError::Internal);
            assert_eq!(err.to_string(), SEND_FAILED_MESSAGE);
            assert_eq!(*provider.calls.lock().unwrap(), 1);
        }
    }
}
