use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use bson::oid::ObjectId;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use sitedesk_services::notify::NotificationStore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::routes::notification::to_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    // Verify JWT before accepting the WebSocket
    let claims = match state.auth.verify_access_token(&params.token) {
        Ok(c) => c,
        Err(_) => {
            return Response::builder()
                .status(401)
                .body("Unauthorized".into())
                .unwrap();
        }
    };

    let user_id = match ObjectId::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => {
            return Response::builder()
                .status(400)
                .body("Invalid user ID".into())
                .unwrap();
        }
    };

    let role = claims.role;
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id, role))
}

async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    user_id: ObjectId,
    role: sitedesk_db::models::UserRole,
) {
    let connection_id = Uuid::new_v4().to_string();
    info!(?user_id, %connection_id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();

    // Each connection owns its feed session; dropping the store tears the
    // subscription down with the socket.
    let store = NotificationStore::new(
        state.notifications.clone(),
        state.settings.notifications.cache_window,
    );
    let mut changes = store.watch_changes();

    // Send connected message
    {
        let msg = serde_json::json!({
            "type": "connected",
            "user_id": user_id.to_hex(),
        });
        let _ = sender
            .send(Message::text(msg.to_string()))
            .await;
    }

    // The store itself refuses activation for non-admin sessions.
    if let Err(e) = store.activate(user_id, role).await {
        warn!(?user_id, %connection_id, %e, "Notification feed activation failed");
    }

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let feed = store.feed();
                let msg = serde_json::json!({
                    "type": "notification:state",
                    "data": {
                        "notifications": feed
                            .notifications
                            .into_iter()
                            .map(to_response)
                            .collect::<Vec<_>>(),
                        "unread_count": feed.unread_count,
                        "is_loading": feed.is_loading,
                    }
                });
                if sender.send(Message::text(msg.to_string())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&store, &user_id, &connection_id, &text, &mut sender)
                            .await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(?user_id, %connection_id, %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    store.deactivate();
    info!(?user_id, %connection_id, "WebSocket disconnected");
}

async fn handle_client_message(
    store: &NotificationStore,
    user_id: &ObjectId,
    connection_id: &str,
    text: &str,
    sender: &mut (impl SinkExt<Message> + Unpin),
) {
    let parsed: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return,
    };

    let msg_type = parsed.get("type").and_then(|t| t.as_str()).unwrap_or("");
    let data = parsed.get("data");

    debug!(?user_id, %connection_id, msg_type, "WS message received");

    match msg_type {
        "ping" => {
            let pong = serde_json::json!({ "type": "pong" });
            let _ = sender.send(Message::text(pong.to_string())).await;
        }
        "notification:mark_read" => {
            if let Some(id) = data
                .and_then(|d| d.get("id"))
                .and_then(|v| v.as_str())
                .and_then(|s| ObjectId::parse_str(s).ok())
            {
                if let Err(e) = store.mark_as_read(id).await {
                    warn!(?user_id, %id, %e, "mark-as-read over WS failed");
                }
            }
        }
        "notification:mark_all_read" => {
            if let Err(e) = store.mark_all_as_read().await {
                warn!(?user_id, %e, "mark-all-as-read over WS failed");
            }
        }
        "notification:refetch" => {
            if let Err(e) = store.fetch().await {
                warn!(?user_id, %e, "feed refetch over WS failed");
            }
        }
        _ => {
            debug!(?user_id, msg_type, "Unhandled WS message type");
        }
    }
}
