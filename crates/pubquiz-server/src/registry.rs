//! Process-wide registry mapping game PINs to live sessions.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{Mutex, RwLock};

use pubquiz_common::game::{GameError, GamePhase, GameSession};

pub type SharedSession = Arc<Mutex<GameSession>>;

const MAX_PIN_ATTEMPTS: usize = 20;

/// Owns the set of live sessions. Create/remove serialize on the map's
/// write lock; lookups run concurrently. Each session carries its own
/// lock, so the map's critical sections stay short.
#[derive(Default)]
pub struct SessionRegistry {
    games: RwLock<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a session under a fresh 4-digit PIN, sampled uniformly
    /// from 1000..=9999, retrying a bounded number of times on collision.
    pub async fn create(&self, host_name: String) -> Result<SharedSession, GameError> {
        let mut games = self.games.write().await;
        let mut rng = rand::thread_rng();
        let pin = (0..MAX_PIN_ATTEMPTS)
            .map(|_| rng.gen_range(1000..=9999u32).to_string())
            .find(|p| !games.contains_key(p))
            .ok_or(GameError::PinExhausted)?;
        let session: SharedSession = Arc::new(Mutex::new(GameSession::new(pin.clone(), host_name)));
        games.insert(pin.clone(), Arc::clone(&session));
        tracing::debug!(%pin, "session registered");
        Ok(session)
    }

    pub async fn lookup(&self, pin: &str) -> Option<SharedSession> {
        self.games.read().await.get(pin).cloned()
    }

    pub async fn remove(&self, pin: &str) -> Option<SharedSession> {
        self.games.write().await.remove(pin)
    }

    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.games.read().await.is_empty()
    }

    /// Snapshot of every live session, for sweeps that must visit each
    /// game without holding the map lock.
    pub async fn entries(&self) -> Vec<(String, SharedSession)> {
        self.games
            .read()
            .await
            .iter()
            .map(|(pin, session)| (pin.clone(), Arc::clone(session)))
            .collect()
    }

    /// Remove every session that has ended. Scans a snapshot first so the
    /// write lock is never held while waiting on a session lock.
    pub async fn evict_ended(&self) -> usize {
        let mut ended = Vec::new();
        for (pin, session) in self.entries().await {
            if session.lock().await.phase == GamePhase::Ended {
                ended.push((pin, session));
            }
        }
        if ended.is_empty() {
            return 0;
        }
        let mut games = self.games.write().await;
        let mut removed = 0;
        for (pin, session) in ended {
            // The PIN may have been freed and reissued since the scan;
            // only evict the exact session we saw.
            if games.get(&pin).is_some_and(|s| Arc::ptr_eq(s, &session)) {
                games.remove(&pin);
                removed += 1;
            }
        }
        removed
    }
}
