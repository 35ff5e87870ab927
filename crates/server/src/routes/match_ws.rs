//! WebSocket gateway for live matches.
//!
//! Each socket gets a connection id and an outbound queue drained by its own
//! writer task. Inbound frames are decoded one at a time, authenticated and
//! routed through the session registry. Closing the socket leaves every match
//! the connection had joined.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::jwt;
use crate::config::Config;
use crate::error::CommandError;
use crate::protocol::{ClientCommand, MatchAction, MatchId, ServerMessage};
use crate::registry::SessionRegistry;
use crate::session::{ConnectionId, Outbound, OUTBOUND_CAPACITY};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Extension(config): Extension<Config>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, config))
}

async fn handle_socket(socket: WebSocket, registry: Arc<SessionRegistry>, config: Config) {
    let conn = registry.next_connection_id();
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let writer = tokio::spawn(write_loop(sender, rx, conn));
    info!(connection = conn, "connection opened");

    // match id -> user name, for the implicit leave on close
    let mut joined: HashMap<MatchId, String> = HashMap::new();

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(t)) => t.to_string(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(connection = conn, error = %e, "transport error");
                break;
            }
        };
        handle_text(&registry, &config, conn, &tx, &mut joined, &text).await;
    }

    for (match_id, username) in joined {
        if let Err(e) = registry
            .dispatch(conn, &username, &tx, match_id, MatchAction::Leave)
            .await
        {
            debug!(connection = conn, match_id, error = %e, "implicit leave failed");
        }
    }

    drop(tx);
    writer.abort();
    info!(connection = conn, "connection closed");
}

async fn handle_text(
    registry: &SessionRegistry,
    config: &Config,
    conn: ConnectionId,
    tx: &Outbound,
    joined: &mut HashMap<MatchId, String>,
    text: &str,
) {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            reply(tx, None, &CommandError::InvalidSyntax(e.to_string()));
            return;
        }
    };
    let match_id = command.match_id();

    let Some(username) = jwt::verify_token(command.auth_token(), &config.jwt_secret) else {
        reply(tx, Some(match_id), &CommandError::Unauthorized);
        return;
    };

    let action = command.into_action();
    match registry.dispatch(conn, &username, tx, match_id, action).await {
        Ok(()) => match action {
            MatchAction::JoinPlayer(_) | MatchAction::JoinObserver => {
                joined.insert(match_id, username);
            }
            MatchAction::Leave => {
                joined.remove(&match_id);
            }
            _ => {}
        },
        Err(e) => {
            debug!(connection = conn, match_id, code = ?e.code(), "command rejected");
            reply(tx, Some(match_id), &e);
        }
    }
}

/// Private error to the command's issuer.
fn reply(tx: &Outbound, match_id: Option<MatchId>, err: &CommandError) {
    if tx.try_send(ServerMessage::error(match_id, err)).is_err() {
        warn!(?match_id, "could not queue error reply");
    }
}

async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerMessage>,
    conn: ConnectionId,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = send_msg(&mut sender, &msg).await {
            warn!(connection = conn, error = %e, "failed to deliver message");
            break;
        }
    }
}

// ---- Helper: send message ----

async fn send_msg(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> Result<()> {
    let json = serde_json::to_string(msg)?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}
