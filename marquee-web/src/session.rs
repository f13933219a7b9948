//! Playback session registry
//!
//! One entry per mounted player, keyed by a UUID embedded in the detail page.
//! Each entry is behind its own mutex so ticks for a session are serialised
//! while different sessions proceed independently. The registry holds at most
//! `max_sessions` entries; creating one past the cap evicts the least recently
//! used session that no request is holding.

use chrono::{DateTime, Duration, Utc};
use marquee_common::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::locker::LockerController;
use crate::surface::PlaybackSurface;

/// A mounted player: which movie/server it shows and its locker state
#[derive(Debug)]
pub struct SessionEntry {
    pub movie_id: i64,
    pub server_index: usize,
    pub surface: PlaybackSurface,
    /// Catalog duration, used until the player reports media metadata
    pub duration_hint: Option<f64>,
    pub controller: LockerController,
    touched_at: DateTime<Utc>,
}

pub type SharedEntry = Arc<Mutex<SessionEntry>>;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedEntry>>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>, idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Register a new session for `video_url` shown on `surface`.
    ///
    /// Idle sessions are pruned first, then the cap is enforced.
    pub async fn create(
        &self,
        movie_id: i64,
        server_index: usize,
        video_url: &str,
        surface: PlaybackSurface,
        duration_hint: Option<f64>,
    ) -> Uuid {
        self.prune().await;

        let id = Uuid::new_v4();
        let mut controller = LockerController::new(video_url, surface.kind);
        controller.set_duration(duration_hint);
        let entry = SessionEntry {
            movie_id,
            server_index,
            surface,
            duration_hint,
            controller,
            touched_at: self.clock.now(),
        };

        let mut sessions = self.sessions.write().await;
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = least_recently_used(&sessions) else {
                warn!(
                    "Session cap of {} exceeded, every session is in use",
                    self.max_sessions
                );
                break;
            };
            sessions.remove(&oldest);
            debug!("Evicted playback session {} at the session cap", oldest);
        }
        sessions.insert(id, Arc::new(Mutex::new(entry)));
        drop(sessions);
        debug!("Created playback session {} for movie {}", id, movie_id);
        id
    }

    /// Look up a session and mark it active
    pub async fn get(&self, id: &Uuid) -> Option<SharedEntry> {
        let entry = self.sessions.read().await.get(id).cloned()?;
        entry.lock().await.touched_at = self.clock.now();
        Some(entry)
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Remove sessions idle longer than the timeout. Entries currently locked
    /// by a request are in use and kept.
    pub async fn prune(&self) -> usize {
        let cutoff = self.clock.now() - self.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(guard) => guard.touched_at >= cutoff,
            Err(_) => true,
        });

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Pruned {} idle playback sessions", removed);
        }
        removed
    }
}

/// Unlocked entry with the oldest activity
fn least_recently_used(sessions: &HashMap<Uuid, SharedEntry>) -> Option<Uuid> {
    sessions
        .iter()
        .filter_map(|(id, entry)| entry.try_lock().ok().map(|guard| (*id, guard.touched_at)))
        .min_by_key(|(_, touched_at)| *touched_at)
        .map(|(id, _)| id)
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("idle_timeout", &self.idle_timeout)
            .field("max_sessions", &self.max_sessions)
            .finish_non_exhaustive()
    }
}
