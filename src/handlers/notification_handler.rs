// src/handlers/notification_handler.rs
use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing;

use crate::{
    errors::{GatewayError, GatewayResult},
    models::notification::{DispatchSuccess, NotificationRequest},
    services::dispatcher::DispatchError,
    state::AppState,
};

/// Request body of the callable protocol.
#[derive(Debug, Deserialize)]
pub struct CallableRequest {
    #[serde(default)]
    pub data: Option<Value>,
}

/// Success body of the callable protocol.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CallableResponse<T> {
    pub result: T,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /sendPushNotification`. Caller identity headers are not inspected.
pub async fn send_push_notification(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> GatewayResult<Json<CallableResponse<DispatchSuccess>>> {
    let data = parse_callable_data(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected callable request");
    })?;

    // Payload problems fail the same way a rejected send does
    let request: NotificationRequest = serde_json::from_value(data).map_err(|e| {
        tracing::error!(error = %e, "Error sending notification");
        DispatchError::Internal
    })?;

    let result = state.dispatcher.dispatch(request).await?;
    Ok(Json(CallableResponse { result }))
}

fn parse_callable_data(body: &[u8]) -> GatewayResult<Value> {
    let envelope: CallableRequest = serde_json::from_slice(body)?;

    envelope
        .data
        .filter(|data| !data.is_null())
        .ok_or_else(|| GatewayError::MissingRequiredField("data".to_string()))
}
