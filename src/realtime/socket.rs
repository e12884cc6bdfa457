//! WebSocket upgrade handlers and per-connection session loops.
//!
//! Each chat connection runs two tasks: the session loop below (reads inbound
//! frames, dispatches them) and a writer task that owns the socket's sending
//! half and drains the connection's outbound queue. The registry only ever
//! sees the queue's sender, so all socket writes stay on one task.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::auth::tokens;
use crate::models::user::User;
use crate::AppState;

use super::dispatcher::DispatchError;
use super::events::{FrameRoute, InboundFrame, OutboundEvent};

/// Close code for failed authentication (policy violation).
const CLOSE_POLICY_VIOLATION: u16 = 1008;

#[derive(Debug, Deserialize)]
struct WsParams {
    token: String,
}

/// How a chat session ended. Every variant funnels through the same cleanup.
#[derive(Debug, Clone, Copy)]
enum SessionEnd {
    ClientClosed,
    TransportError,
    ProtocolError,
}

impl SessionEnd {
    fn as_str(self) -> &'static str {
        match self {
            SessionEnd::ClientClosed => "client_closed",
            SessionEnd::TransportError => "transport_error",
            SessionEnd::ProtocolError => "protocol_error",
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/chat", get(chat_upgrade))
        .route("/ws/notifications", get(notifications_upgrade))
}

async fn chat_upgrade(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat(socket, state, params.token))
}

async fn notifications_upgrade(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_notifications(socket, state, params.token))
}

/// Exchange the connection token for a verified user identity.
async fn authenticate(state: &AppState, token: &str) -> Option<User> {
    let user_id = tokens::verify_token(token, &state.config.jwt_secret)?;
    state.store.find_user(user_id).await.ok().flatten()
}

/// Close the connection with a policy-violation code before it ever becomes
/// active.
async fn reject(mut socket: WebSocket, reason: &'static str) {
    tracing::debug!(%reason, "rejecting socket");
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: CLOSE_POLICY_VIOLATION,
            reason: reason.into(),
        })))
        .await;
}

/// The chat session: Connecting → Authenticating → Active → Closed.
async fn handle_chat(socket: WebSocket, state: AppState, token: String) {
    let Some(user) = authenticate(&state, &token).await else {
        reject(socket, "Authentication failed").await;
        return;
    };

    let (ws_tx, mut ws_rx) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let mut writer = tokio::spawn(run_writer(ws_tx, rx));

    // Active: install the connection. A duplicate login displaces the
    // previous entry atomically; dropping the displaced handle ends its
    // writer, which closes the superseded socket.
    let (conn_id, displaced) = state.registry.register(user.id, tx);
    if displaced.is_some() {
        tracing::info!(user_id = user.id, "displacing previous connection");
    }
    drop(displaced);

    // Seed the routing group set from current memberships. Connect-time only;
    // later membership changes arrive through the groups routes.
    match state.store.groups_for_user(user.id).await {
        Ok(groups) => {
            for group in &groups {
                state.registry.add_group(user.id, group.id);
            }
        }
        Err(err) => {
            tracing::warn!(user_id = user.id, ?err, "failed to load group memberships");
        }
    }

    tracing::info!(
        user_id = user.id,
        username = %user.username,
        groups = state.registry.group_set(user.id).map(|g| g.len()).unwrap_or(0),
        "chat session established"
    );

    // The select arm that sees the writer finish consumes its JoinHandle;
    // awaiting it a second time below would panic.
    let mut writer_done = false;
    let end = loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match dispatch_frame(&state, user.id, text.as_str()).await {
                            Ok(()) => {}
                            Err(end) => break end,
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break SessionEnd::ClientClosed,
                    Some(Ok(_)) => continue, // ping/pong/binary
                    Some(Err(err)) => {
                        tracing::debug!(user_id = user.id, ?err, "ws read error");
                        break SessionEnd::TransportError;
                    }
                }
            }

            // The writer ends when a socket write fails or when this
            // connection is unregistered out from under us (displacement).
            _ = &mut writer => {
                writer_done = true;
                break SessionEnd::TransportError;
            }
        }
    };

    // Closed: cleanup runs exactly once, whichever trigger fired. The
    // conn-id guard keeps a displaced session from evicting its replacement.
    state.registry.unregister_conn(user.id, conn_id);
    if !writer_done {
        let _ = writer.await;
    }

    tracing::info!(user_id = user.id, reason = end.as_str(), "chat session ended");
}

/// Decode and dispatch one inbound text frame. Malformed or semantically
/// incomplete frames are dropped without surfacing an error to the sender;
/// only a storage failure ends the session.
async fn dispatch_frame(state: &AppState, user_id: i64, text: &str) -> Result<(), SessionEnd> {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => {
            tracing::debug!(user_id, "dropping malformed frame");
            return Ok(());
        }
    };

    let result = match frame.route() {
        Some(FrameRoute::Personal(recipient_id)) => state
            .dispatcher
            .route_personal(user_id, recipient_id, &frame.content)
            .await
            .map(|_| ()),
        Some(FrameRoute::Group(group_id)) => state
            .dispatcher
            .route_group(user_id, group_id, &frame.content)
            .await
            .map(|_| ()),
        None => {
            tracing::debug!(user_id, "dropping incomplete frame");
            return Ok(());
        }
    };

    match result {
        Ok(()) => Ok(()),
        // The socket path drops unknown destinations silently; the REST path
        // is where these reject loudly.
        Err(DispatchError::UnknownRecipient) | Err(DispatchError::UnknownGroup) => {
            tracing::debug!(user_id, "dropping frame for unknown destination");
            Ok(())
        }
        Err(DispatchError::Storage(err)) => {
            tracing::error!(user_id, ?err, "storage failure during dispatch");
            Err(SessionEnd::ProtocolError)
        }
    }
}

/// Single-writer task: drains the outbound queue into the socket. When the
/// queue closes (session unregistered or displaced) it tells the client and
/// finishes.
async fn run_writer(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(frame) = rx.recv().await {
        if ws_tx.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
    let _ = ws_tx.send(Message::Close(None)).await;
}

/// The notification stream: push one `unread_count` snapshot, then idle,
/// discarding inbound frames until the client goes away. Never registers
/// with the connection registry.
async fn handle_notifications(mut socket: WebSocket, state: AppState, token: String) {
    let Some(user) = authenticate(&state, &token).await else {
        reject(socket, "Authentication failed").await;
        return;
    };

    let count = match state.store.count_unread(user.id).await {
        Ok(count) => count,
        Err(err) => {
            tracing::error!(user_id = user.id, ?err, "failed to count unread notifications");
            return;
        }
    };

    let snapshot = OutboundEvent::UnreadCount { count };
    if socket
        .send(Message::Text(snapshot.to_frame().into()))
        .await
        .is_err()
    {
        return;
    }

    tracing::debug!(user_id = user.id, count, "notification stream opened");

    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}
