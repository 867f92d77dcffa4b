// src/models/notification.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const CALL_TYPE: &str = "call";

pub const DEFAULT_SOUND: &str = "default";
pub const ANDROID_RINGTONE_SOUND: &str = "ringtone";
pub const APNS_RINGTONE_SOUND: &str = "ringtone.caf";

pub const DEFAULT_CHAT_CHANNEL: &str = "chat_channel_v1";
pub const DEFAULT_CALL_CHANNEL: &str = "call_channel_v1";

/// Push request sent by the mobile app for a single device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    /// Passed to the provider as-is, even when empty.
    #[serde(default)]
    pub target_token: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub sender_id: String,
    pub sender_name: String,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_image: Option<String>,
    pub chat_id: String,
    pub call_id: String,
    #[serde(default)]
    pub call_type: Option<String>,
    #[serde(default)]
    pub extra_data: Option<HashMap<String, String>>,
}

impl NotificationRequest {
    pub fn is_call(&self) -> bool {
        self.notification_type == CALL_TYPE
    }
}

/// Provider-ready message, serialized in the FCM v1 `Message` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationEnvelope {
    pub token: String,
    pub notification: NotificationContent,
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AndroidNotification {
    pub sound: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Aps {
    pub sound: String,
}

/// Android notification channels a message can be routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub chat_channel_id: String,
    pub call_channel_id: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            chat_channel_id: DEFAULT_CHAT_CHANNEL.to_string(),
            call_channel_id: DEFAULT_CALL_CHANNEL.to_string(),
        }
    }
}

/// Body of a successful callable response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchSuccess {
    pub success: bool,
}

impl DispatchSuccess {
    pub fn new() -> Self {
        Self { success: true }
    }
}
