#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use match_server::auth::jwt;
use match_server::config::Config;
use match_server::protocol::{MatchId, ServerMessage};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub const SECRET: &str = "integration-test-secret";

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a server on an ephemeral port and return its address.
pub async fn spawn_server() -> SocketAddr {
    let config = Config {
        jwt_secret: SECRET.to_string(),
        ..Config::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        match_server::serve(listener, config).await.unwrap();
    });
    addr
}

pub async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

/// Signed token identifying `username`.
pub fn token(username: &str) -> String {
    jwt::create_token(username, SECRET, 1).unwrap()
}

pub async fn send_raw(ws: &mut Client, text: &str) {
    ws.send(Message::text(text.to_string())).await.unwrap();
}

pub async fn send(ws: &mut Client, command: Value) {
    send_raw(ws, &command.to_string()).await;
}

pub async fn join_player(ws: &mut Client, user: &str, match_id: MatchId, color: &str) {
    send(
        ws,
        json!({
            "type": "join_player",
            "auth_token": token(user),
            "match_id": match_id,
            "color": color,
        }),
    )
    .await;
}

pub async fn join_observer(ws: &mut Client, user: &str, match_id: MatchId) {
    send(
        ws,
        json!({ "type": "join_observer", "auth_token": token(user), "match_id": match_id }),
    )
    .await;
}

/// Send a move in coordinate notation, e.g. "e2e4".
pub async fn make_move(ws: &mut Client, user: &str, match_id: MatchId, mv: &str) {
    let mv: chess_core::Move = mv.parse().unwrap();
    send(
        ws,
        json!({
            "type": "make_move",
            "auth_token": token(user),
            "match_id": match_id,
            "move": mv,
        }),
    )
    .await;
}

/// Next server message, failing the test after a few seconds of silence.
pub async fn recv(ws: &mut Client) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a server message")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Assert nothing arrives for a short while.
pub async fn expect_silence(ws: &mut Client) {
    if let Ok(Some(Ok(frame))) = tokio::time::timeout(Duration::from_millis(300), ws.next()).await {
        panic!("unexpected message: {frame:?}");
    }
}
