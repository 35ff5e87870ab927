//! Process-wide map from match id to its session.
//!
//! The map lock is only held to look up or insert a session. Commands run
//! under the session's own mutex, so unrelated matches never wait on each
//! other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::CommandError;
use crate::protocol::{MatchAction, MatchId};
use crate::session::{ConnectionId, MatchSession, Outbound};

pub type SharedSession = Arc<Mutex<MatchSession>>;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<MatchId, SharedSession>>,
    next_connection: AtomicU64,
    reclaim_empty: bool,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SessionRegistry {
    pub fn new(reclaim_empty: bool) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_connection: AtomicU64::new(1),
            reclaim_empty,
        }
    }

    /// Fresh identity for an accepted connection.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn get(&self, match_id: MatchId) -> Option<SharedSession> {
        self.sessions.read().await.get(&match_id).cloned()
    }

    /// Existing session for `match_id`, or a new one with a fresh game.
    pub async fn get_or_create(&self, match_id: MatchId) -> SharedSession {
        if let Some(session) = self.get(match_id).await {
            return session;
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(match_id)
            .or_insert_with(|| {
                info!(match_id, "created match session");
                Arc::new(Mutex::new(MatchSession::new(match_id)))
            })
            .clone()
    }

    /// Drop the session if nobody is left in it. Returns whether it was
    /// removed.
    pub async fn remove_if_empty(&self, match_id: MatchId) -> bool {
        let Some(session) = self.get(match_id).await else {
            return false;
        };

        // Close under the session lock only; the map stays free meanwhile.
        {
            let mut guard = session.lock().await;
            if !guard.is_empty() || guard.is_closed() {
                return false;
            }
            guard.close();
        }

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&match_id)
            .is_some_and(|current| Arc::ptr_eq(current, &session))
        {
            sessions.remove(&match_id);
        }
        info!(match_id, "reclaimed empty match session");
        true
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Run one authenticated command against its match.
    ///
    /// Joins create the session on demand; every other command needs an
    /// existing one.
    pub async fn dispatch(
        &self,
        conn: ConnectionId,
        username: &str,
        outbound: &Outbound,
        match_id: MatchId,
        action: MatchAction,
    ) -> Result<(), CommandError> {
        debug!(match_id, connection = conn, user = %username, ?action, "dispatching command");

        if matches!(action, MatchAction::JoinPlayer(_) | MatchAction::JoinObserver) {
            loop {
                let shared = self.get_or_create(match_id).await;
                let mut session = shared.lock().await;
                // Lost a race with reclaim: the session is being dropped from
                // the map, so let the reclaim finish and look it up again.
                if session.is_closed() {
                    drop(session);
                    tokio::task::yield_now().await;
                    continue;
                }
                return session.handle(conn, username, action, outbound);
            }
        }

        let shared = self
            .get(match_id)
            .await
            .ok_or(CommandError::UnknownMatch(match_id))?;
        let mut session = shared.lock().await;
        if session.is_closed() {
            return Err(CommandError::UnknownMatch(match_id));
        }
        session.handle(conn, username, action, outbound)?;
        let now_empty = session.is_empty();
        drop(session);

        if now_empty && self.reclaim_empty {
            self.remove_if_empty(match_id).await;
        }
        Ok(())
    }
}
