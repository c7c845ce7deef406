use axum::{
    Json,
    extract::{Path, State},
};
use bson::oid::ObjectId;
use serde::Serialize;
use sitedesk_db::models::Notification;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: String,
}

pub fn to_response(notification: Notification) -> NotificationResponse {
    NotificationResponse {
        id: notification.id.map(|id| id.to_hex()).unwrap_or_default(),
        kind: serde_json::to_value(notification.kind)
            .ok()
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_default(),
        title: notification.title,
        message: notification.message,
        payload: serde_json::to_value(&notification.payload)
            .unwrap_or(serde_json::Value::Null),
        is_read: notification.is_read,
        created_at: notification
            .created_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: usize,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let window = state.settings.notifications.cache_window as i64;
    let rows = state
        .notifications
        .recent_for_recipient(auth.user_id, window)
        .await?;

    let unread_count = rows.iter().filter(|n| !n.is_read).count();
    Ok(Json(NotificationListResponse {
        notifications: rows.into_iter().map(to_response).collect(),
        unread_count,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = ObjectId::parse_str(&notification_id)
        .map_err(|_| ApiError::BadRequest("Invalid notification_id".to_string()))?;
    state.notifications.mark_read(auth.user_id, id).await?;
    Ok(Json(serde_json::json!({ "read": true })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state.notifications.mark_all_read(auth.user_id).await?;
    Ok(Json(serde_json::json!({ "read": updated })))
}
