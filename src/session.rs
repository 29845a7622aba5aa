//! In-process session registry.
//!
//! Each browser gets a random cookie ID pointing at a [`Session`] held in
//! memory: the logged-in user, the shopping cart, the staff
//! sale-in-progress, the wishlist and pending flash messages. Sessions
//! are evicted after a period of inactivity by a background task.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const SESSION_COOKIE: &str = "cafeito_session";
const SESSION_ID_LEN: usize = 32;
const CLEANUP_CHECK_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize)]
pub struct Flash {
    pub level: &'static str,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: "success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: "error",
            message: message.into(),
        }
    }
}

/// Per-browser state. Quantity maps preserve insertion order so cart and
/// sale lines render in the order they were added.
#[derive(Debug)]
pub struct Session {
    pub user_id: Option<i64>,
    pub cart: IndexMap<i64, i64>,
    pub sale: IndexMap<i64, i64>,
    pub wishlist: Vec<i64>,
    pub flashes: Vec<Flash>,
    last_seen: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            user_id: None,
            cart: IndexMap::new(),
            sale: IndexMap::new(),
            wishlist: Vec::new(),
            flashes: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() > ttl
    }
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_CHECK_SECS));
            loop {
                interval.tick().await;
                self.evict_expired();
            }
        });
    }

    /// Resolve the session for a request, creating one when the cookie is
    /// missing or stale. Returns the jar to send back with the response.
    pub fn ensure(&self, jar: CookieJar) -> (CookieJar, String) {
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            let id = cookie.value().to_string();
            let mut sessions = self.sessions.lock();
            if let Some(session) = sessions.get_mut(&id) {
                session.last_seen = Instant::now();
                return (jar, id);
            }
        }

        let id = random_session_id();
        self.sessions.lock().insert(id.clone(), Session::new());

        let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
            .path("/")
            .http_only(true);
        (jar.add(cookie), id)
    }

    /// Run a closure against the session, re-creating it if eviction won
    /// a race with the request.
    pub fn with_session<F, R>(&self, id: &str, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(Session::new);
        session.last_seen = Instant::now();
        f(session)
    }

    pub fn user_id(&self, id: &str) -> Option<i64> {
        self.with_session(id, |s| s.user_id)
    }

    pub fn push_flash(&self, id: &str, flash: Flash) {
        self.with_session(id, |s| s.flashes.push(flash));
    }

    pub fn take_flashes(&self, id: &str) -> Vec<Flash> {
        self.with_session(id, |s| std::mem::take(&mut s.flashes))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_expired(&self) {
        let mut sessions = self.sessions.lock();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.is_expired(self.ttl))
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            sessions.remove(&id);
            tracing::debug!(session_id = %id, "evicted expired session");
        }
    }
}

fn random_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}
