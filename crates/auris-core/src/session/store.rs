//! In-memory session store.
//!
//! A mapping from session id to [`Session`], with per-session locking
//! (not a single global lock, so concurrent requests against different
//! sessions never contend) and LRU eviction when the store is at capacity.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use lru::LruCache;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::ScoredEpisode;

/// Opaque session identifier.
pub type SessionId = String;

fn new_session_id() -> SessionId {
    Uuid::new_v4().to_string()
}

/// Server-side record holding a ranked queue and pagination cursor for a
/// single "For You" request stream.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub queue: Vec<ScoredEpisode>,
    pub cursor: usize,
    pub cold_start: bool,
    pub created_at: DateTime<Utc>,
    pub algorithm_version: String,
    pub dataset_version: String,
    pub engaged_ids: HashSet<String>,
    pub excluded_ids: HashSet<String>,
    pub user_vector_episode_count: usize,
}

impl Session {
    /// Return the next `count` items starting at the cursor and advance it.
    /// `cursor` is clamped to `|queue|`.
    fn advance(&mut self, count: usize) -> Vec<ScoredEpisode> {
        let start = self.cursor.min(self.queue.len());
        let end = (start + count).min(self.queue.len());
        self.cursor = end;
        self.queue[start..end].to_vec()
    }
}

/// Each session is guarded by its own mutex so that two concurrent updates
/// to *different* sessions never contend, while updates to the *same*
/// session are serialized.
struct SessionEntry {
    session: Mutex<Session>,
}

/// In-memory, LRU-bounded session store.
pub struct SessionStore {
    entries: Mutex<LruCache<SessionId, Arc<SessionEntry>>>,
}

impl SessionStore {
    /// Build a store that evicts the least-recently-used session once more
    /// than `capacity` sessions are live.
    pub fn new(capacity: usize) -> Self {
        let capacity = std::num::NonZeroUsize::new(capacity).unwrap_or(std::num::NonZeroUsize::new(1).unwrap());
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Insert a freshly created session, returning its id.
    pub fn create(&self, mut session: Session) -> SessionId {
        if session.session_id.is_empty() {
            session.session_id = new_session_id();
        }
        let id = session.session_id.clone();
        let entry = Arc::new(SessionEntry {
            session: Mutex::new(session),
        });
        let mut entries = self.entries.lock().expect("session store mutex poisoned");
        entries.put(id.clone(), entry);
        id
    }

    fn get_entry(&self, session_id: &str) -> Result<Arc<SessionEntry>> {
        let mut entries = self.entries.lock().expect("session store mutex poisoned");
        entries
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Read a snapshot of a session's current state.
    pub fn get(&self, session_id: &str) -> Result<Session> {
        let entry = self.get_entry(session_id)?;
        let guard = entry.session.lock().expect("session mutex poisoned");
        Ok(guard.clone())
    }

    /// Advance the cursor and return the next `count` items.
    pub fn next(&self, session_id: &str, count: usize) -> Result<Vec<ScoredEpisode>> {
        let entry = self.get_entry(session_id)?;
        let mut guard = entry.session.lock().expect("session mutex poisoned");
        Ok(guard.advance(count))
    }

    /// Record an engagement against a session's in-memory state: mark the
    /// episode engaged and excluded. Does not
    /// verify series/episode membership beyond checking the queue — the
    /// caller decides whether a non-member episode id is an error.
    pub fn mark_engaged(&self, session_id: &str, episode_id: &str) -> Result<bool> {
        let entry = self.get_entry(session_id)?;
        let mut guard = entry.session.lock().expect("session mutex poisoned");
        let in_queue = guard.queue.iter().any(|s| s.episode.id == episode_id);
        if in_queue {
            guard.engaged_ids.insert(episode_id.to_string());
            guard.excluded_ids.insert(episode_id.to_string());
        }
        Ok(in_queue)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("session store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, queue_len: usize) -> Session {
        Session {
            session_id: id.to_string(),
            queue: Vec::new(),
            cursor: 0,
            cold_start: true,
            created_at: Utc::now(),
            algorithm_version: "foryou-v1".to_string(),
            dataset_version: "test".to_string(),
            engaged_ids: HashSet::new(),
            excluded_ids: HashSet::new(),
            user_vector_episode_count: queue_len,
        }
    }

    #[test]
    fn unknown_session_id_fails() {
        let store = SessionStore::new(4);
        let err = store.get("nope").unwrap_err();
        assert_eq!(err.kind(), "session_not_found");
    }

    #[test]
    fn pagination_cursor_is_clamped_and_monotone() {
        let store = SessionStore::new(4);
        let id = store.create(session("s1", 0));

        let page = store.next(&id, 0).unwrap();
        assert!(page.is_empty());

        let snapshot = store.get(&id).unwrap();
        assert_eq!(snapshot.cursor, 0);
    }

    #[test]
    fn lru_eviction_drops_oldest_session() {
        let store = SessionStore::new(1);
        let first = store.create(session("s1", 0));
        let _second = store.create(session("s2", 0));
        assert!(store.get(&first).is_err());
    }

    #[test]
    fn create_assigns_a_session_id_when_absent() {
        let store = SessionStore::new(4);
        let mut s = session("", 0);
        s.session_id.clear();
        let id = store.create(s);
        assert!(!id.is_empty());
    }
}
