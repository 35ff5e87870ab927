//! One live match: the authoritative game plus everyone connected to it.
//!
//! A `MatchSession` is always used behind its own lock (see
//! [`crate::registry::SessionRegistry`]), so each method runs to completion
//! before the next command for the same match is looked at. Outbound delivery
//! is a non-blocking send on a bounded per-connection queue; a closed or full
//! queue is logged and the message skipped.

use std::collections::BTreeMap;

use chess_core::{Color, Game, GameStatus, Move, MoveRecord};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

use crate::error::CommandError;
use crate::protocol::{MatchAction, MatchId, ServerMessage};

pub type ConnectionId = u64;
pub type Outbound = mpsc::Sender<ServerMessage>;

/// Messages queued per connection before further ones are dropped.
pub const OUTBOUND_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    WhitePlayer,
    BlackPlayer,
    Observer,
}

impl Role {
    pub fn player(color: Color) -> Self {
        match color {
            Color::White => Role::WhitePlayer,
            Color::Black => Role::BlackPlayer,
        }
    }

    pub fn color(self) -> Option<Color> {
        match self {
            Role::WhitePlayer => Some(Color::White),
            Role::BlackPlayer => Some(Color::Black),
            Role::Observer => None,
        }
    }
}

struct Participant {
    username: String,
    role: Role,
    outbound: Outbound,
}

pub struct MatchSession {
    match_id: MatchId,
    game: Game,
    participants: BTreeMap<ConnectionId, Participant>,
    /// Set once the registry has dropped this session; late arrivals must
    /// look it up again.
    closed: bool,
}

impl MatchSession {
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            game: Game::new(),
            participants: BTreeMap::new(),
            closed: false,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn role_of(&self, conn: ConnectionId) -> Option<Role> {
        self.participants.get(&conn).map(|p| p.role)
    }

    /// User name currently holding `color`'s seat.
    pub fn player(&self, color: Color) -> Option<&str> {
        let role = Role::player(color);
        self.participants
            .values()
            .find(|p| p.role == role)
            .map(|p| p.username.as_str())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    /// Route an authenticated command to the matching operation.
    pub fn handle(
        &mut self,
        conn: ConnectionId,
        username: &str,
        action: MatchAction,
        outbound: &Outbound,
    ) -> Result<(), CommandError> {
        match action {
            MatchAction::JoinPlayer(color) => self.join_as_player(conn, username, color, outbound.clone()),
            MatchAction::JoinObserver => {
                self.join_as_observer(conn, username, outbound.clone());
                Ok(())
            }
            MatchAction::MakeMove(mv) => self.submit_move(conn, mv),
            MatchAction::Resign => self.resign(conn),
            MatchAction::Leave => self.leave(conn),
        }
    }

    /// Take `color`'s seat. Fails if another connection already holds it.
    pub fn join_as_player(
        &mut self,
        conn: ConnectionId,
        username: &str,
        color: Color,
        outbound: Outbound,
    ) -> Result<(), CommandError> {
        let role = Role::player(color);
        let holder = self
            .participants
            .iter()
            .find(|(_, p)| p.role == role)
            .map(|(&id, _)| id);
        if holder.is_some_and(|id| id != conn) {
            return Err(CommandError::ColorTaken(color));
        }

        let rejoin = holder == Some(conn);
        self.bind(conn, username, role, outbound);
        if !rejoin {
            self.broadcast(
                self.notification(format!("{username} joined match {} as {color}", self.match_id)),
                Some(conn),
            );
        }
        Ok(())
    }

    pub fn join_as_observer(&mut self, conn: ConnectionId, username: &str, outbound: Outbound) {
        let rejoin = self.role_of(conn) == Some(Role::Observer);
        self.bind(conn, username, Role::Observer, outbound);
        if !rejoin {
            self.broadcast(
                self.notification(format!("{username} is now observing match {}", self.match_id)),
                Some(conn),
            );
        }
    }

    /// Insert or rebind the connection, then send it the current state.
    fn bind(&mut self, conn: ConnectionId, username: &str, role: Role, outbound: Outbound) {
        self.participants.insert(
            conn,
            Participant {
                username: username.to_string(),
                role,
                outbound,
            },
        );
        info!(match_id = self.match_id, connection = conn, user = %username, ?role, "joined match");
        self.send_to(conn, self.state_message());
    }

    pub fn submit_move(&mut self, conn: ConnectionId, mv: Move) -> Result<(), CommandError> {
        let participant = self
            .participants
            .get(&conn)
            .ok_or(CommandError::NotJoined(self.match_id))?;
        let color = participant
            .role
            .color()
            .ok_or(CommandError::NotAPlayer("move pieces"))?;
        let username = participant.username.clone();

        if self.game.is_over() {
            return Err(CommandError::GameOver);
        }
        if self.game.turn() != color {
            return Err(CommandError::NotYourTurn);
        }
        if self
            .game
            .board()
            .get(mv.start)
            .is_some_and(|piece| piece.color != color)
        {
            return Err(CommandError::IllegalMove(format!(
                "The piece on {} is not yours",
                mv.start
            )));
        }

        let record = self.game.make_move(mv)?;

        self.broadcast(self.state_message(), None);
        self.broadcast(
            self.notification(describe_move(&username, color, &record)),
            Some(conn),
        );

        let to_move = self.game.turn();
        let status_note = match self.game.status() {
            GameStatus::Check => Some(format!("{to_move} is in check")),
            GameStatus::Checkmate => Some(format!("Checkmate! {color} wins")),
            GameStatus::Stalemate => Some("Stalemate. The game is a draw".to_string()),
            _ => None,
        };
        if let Some(note) = status_note {
            if self.game.is_over() {
                info!(match_id = self.match_id, status = ?self.game.status(), "game finished");
            }
            self.broadcast(self.notification(note), None);
        }
        Ok(())
    }

    pub fn resign(&mut self, conn: ConnectionId) -> Result<(), CommandError> {
        let participant = self
            .participants
            .get(&conn)
            .ok_or(CommandError::NotJoined(self.match_id))?;
        let color = participant
            .role
            .color()
            .ok_or(CommandError::NotAPlayer("resign"))?;
        let username = participant.username.clone();

        if self.game.is_over() {
            return Err(CommandError::GameOver);
        }

        self.game.resign(color);
        info!(match_id = self.match_id, user = %username, %color, "player resigned");
        self.broadcast(
            self.notification(format!(
                "{username} ({color}) resigned. {} wins",
                color.opposite()
            )),
            None,
        );
        Ok(())
    }

    /// Remove the connection, freeing its seat if it held one.
    pub fn leave(&mut self, conn: ConnectionId) -> Result<(), CommandError> {
        let participant = self
            .participants
            .remove(&conn)
            .ok_or(CommandError::NotJoined(self.match_id))?;

        info!(match_id = self.match_id, connection = conn, user = %participant.username, "left match");
        self.broadcast(
            self.notification(format!(
                "{} left match {}",
                participant.username, self.match_id
            )),
            None,
        );
        Ok(())
    }

    fn state_message(&self) -> ServerMessage {
        ServerMessage::State {
            match_id: self.match_id,
            game: self.game.clone(),
            white: self.player(Color::White).map(str::to_string),
            black: self.player(Color::Black).map(str::to_string),
        }
    }

    fn notification(&self, message: String) -> ServerMessage {
        ServerMessage::Notification {
            match_id: self.match_id,
            message,
        }
    }

    fn send_to(&self, conn: ConnectionId, msg: ServerMessage) {
        if let Some(p) = self.participants.get(&conn) {
            deliver(self.match_id, conn, p, msg);
        }
    }

    /// Send `msg` to every participant except `skip`. A dead receiver does not
    /// stop delivery to the rest.
    fn broadcast(&self, msg: ServerMessage, skip: Option<ConnectionId>) {
        for (&conn, p) in &self.participants {
            if Some(conn) != skip {
                deliver(self.match_id, conn, p, msg.clone());
            }
        }
    }
}

fn deliver(match_id: MatchId, conn: ConnectionId, p: &Participant, msg: ServerMessage) {
    match p.outbound.try_send(msg) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(match_id, connection = conn, "outbound queue full, dropping message");
        }
        Err(TrySendError::Closed(_)) => {
            warn!(match_id, connection = conn, "dropping message for closed connection");
        }
    }
}

fn describe_move(username: &str, color: Color, record: &MoveRecord) -> String {
    let mv = record.mv;
    let mut text = if record.castled {
        let side = if mv.end.col > mv.start.col { "kingside" } else { "queenside" };
        format!("{username} ({color}) castled {side}")
    } else {
        format!("{username} ({color}) moved {} {} to {}", record.piece.kind, mv.start, mv.end)
    };
    if let Some(captured) = record.captured {
        text.push_str(&format!(", capturing {}", captured.kind));
    }
    if let Some(kind) = mv.promotion {
        text.push_str(&format!(", promoting to {kind}"));
    }
    text
}
