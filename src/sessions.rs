//! Server-side session registry. Each session owns its own storage slot
//! and cart engine; sessions expire after a configurable idle TTL and the
//! registry is capped, evicting the longest-idle session when full.
//! Dropping a session drops its storage, which is what clears the cart
//! when the session ends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cart::CartStore;
use crate::cart::storage::MemoryStorage;

pub const SESSION_COOKIE: &str = "garage_sid";

const CART_SLOT_KEY: &str = "cart";

/// Registry cap; beyond this the longest-idle session is evicted.
const MAX_SESSIONS: usize = 10_000;

pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub cart: CartStore,
    admin: AtomicBool,
    last_seen: Mutex<Instant>,
}

impl Session {
    fn new() -> Self {
        let storage = Arc::new(MemoryStorage::new());
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            cart: CartStore::new(storage, CART_SLOT_KEY),
            admin: AtomicBool::new(false),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin.load(Ordering::Relaxed)
    }

    pub fn set_admin(&self, value: bool) {
        self.admin.store(value, Ordering::Relaxed);
    }

    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }
}

pub struct Sessions {
    inner: RwLock<HashMap<Uuid, Arc<Session>>>,
    ttl: Duration,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self
            .inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned();
        if let Some(session) = &session {
            session.touch();
        }
        session
    }

    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.len() >= MAX_SESSIONS {
            if let Some(oldest) = inner
                .values()
                .max_by_key(|s| s.idle())
                .map(|s| s.id)
            {
                inner.remove(&oldest);
                tracing::warn!(session = %oldest, "session registry full; evicted longest-idle session");
            }
        }
        inner.insert(session.id, session.clone());
        session
    }

    /// Resolves the cookie's session or creates a fresh one. The bool is
    /// true when a new session (and cookie) was minted.
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Arc<Session>, bool) {
        if let Some(id) = id {
            if let Some(session) = self.get(id) {
                return (session, false);
            }
        }
        (self.create(), true)
    }

    /// Drops sessions idle past the TTL.
    pub fn prune(&self) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let before = inner.len();
        inner.retain(|_, session| session.idle() < self.ttl);
        let expired = before - inner.len();
        if expired > 0 {
            tracing::debug!(expired, live = inner.len(), "pruned expired sessions");
        }
    }

    /// Runs the cross-process cart reconciliation sweep over every live
    /// session.
    pub fn reconcile_carts(&self) {
        let sessions: Vec<Arc<Session>> = self
            .inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for session in sessions {
            session.cart.reconcile();
        }
    }
}
