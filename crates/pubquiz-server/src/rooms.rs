//! Connection router: maps live connections to named rooms and fans
//! outbound events to them.
//!
//! Two room conventions exist by dispatcher policy: `game-<pin>` holds the
//! host and every team of a session, `host-<pin>` holds only the host.
//! The router itself does not interpret room names.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use pubquiz_common::protocol::{ServerEvent, ServerFrame};

/// Capacity of each connection's outbound queue.
pub const OUTBOUND_BUFFER: usize = 64;

pub fn game_room(pin: &str) -> String {
    format!("game-{pin}")
}

pub fn host_room(pin: &str) -> String {
    format!("host-{pin}")
}

/// Connection-id -> sender map plus room membership. Senders are the
/// write-task ends of each connection's outbound queue, so delivery order
/// per recipient follows enqueue order. Locks are never held across a
/// send: membership and senders are snapshotted first.
#[derive(Default)]
pub struct ConnectionRouter {
    conns: RwLock<HashMap<Uuid, mpsc::Sender<ServerFrame>>>,
    rooms: RwLock<HashMap<String, HashSet<Uuid>>>,
}

impl ConnectionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, conn: Uuid, tx: mpsc::Sender<ServerFrame>) {
        self.conns.write().await.insert(conn, tx);
    }

    /// Drop a connection and its room memberships. Rooms left empty are
    /// removed entirely.
    pub async fn unregister(&self, conn: Uuid) {
        {
            let mut rooms = self.rooms.write().await;
            for members in rooms.values_mut() {
                members.remove(&conn);
            }
            rooms.retain(|_, members| !members.is_empty());
        }
        self.conns.write().await.remove(&conn);
    }

    pub async fn join(&self, conn: Uuid, room: &str) {
        self.rooms
            .write()
            .await
            .entry(room.to_string())
            .or_default()
            .insert(conn);
    }

    pub async fn leave(&self, conn: Uuid, room: &str) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room) {
            members.remove(&conn);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    /// Deliver an event to every live connection in `room`.
    pub async fn broadcast(&self, room: &str, event: ServerEvent) {
        let members: Vec<Uuid> = {
            let rooms = self.rooms.read().await;
            match rooms.get(room) {
                Some(members) => members.iter().copied().collect(),
                None => return,
            }
        };
        let targets: Vec<mpsc::Sender<ServerFrame>> = {
            let conns = self.conns.read().await;
            members
                .iter()
                .filter_map(|id| conns.get(id).cloned())
                .collect()
        };
        let frame = ServerFrame::Event(event);
        for tx in targets {
            // A full or closed queue means the reader is gone or stalled;
            // the connection's own lifecycle handles teardown.
            let _ = tx.send(frame.clone()).await;
        }
    }

    /// Unicast a frame to one connection.
    pub async fn emit(&self, conn: Uuid, frame: ServerFrame) {
        let tx = self.conns.read().await.get(&conn).cloned();
        if let Some(tx) = tx {
            let _ = tx.send(frame).await;
        }
    }
}
