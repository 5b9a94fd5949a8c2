//! In-memory login sessions.
//!
//! Sessions live only in process memory and expire after a configurable
//! time. Unlike a one-shot token, a session stays valid for repeated
//! requests until it expires or is revoked.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Data associated with a session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub expires_at: Instant,
}

/// Thread-safe session store with expiry.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    /// Creates a store whose sessions last `ttl_minutes`.
    pub fn new(ttl_minutes: u64) -> Self {
        Self::with_ttl(Duration::from_secs(ttl_minutes * 60))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Opens a session and returns its token (32 bytes, base64url).
    pub fn create(&self, user_id: &str, email: &str) -> String {
        let token = generate_token();
        let session = Session {
            user_id: user_id.to_string(),
            email: email.to_string(),
            expires_at: Instant::now() + self.ttl,
        };

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), session);
        token
    }

    /// Returns the session for `token` if it exists and has not expired.
    /// Expired sessions are dropped on lookup.
    pub fn validate(&self, token: &str) -> Option<Session> {
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(token) {
                Some(session) if Instant::now() <= session.expires_at => {
                    return Some(session.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.revoke(token);
        None
    }

    /// Ends a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    /// Removes all expired sessions.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Generates a secure random token.
///
/// Returns 32 random bytes encoded as base64url (no padding).
fn generate_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_create_returns_unique_tokens() {
        let store = SessionStore::new(10);

        let token1 = store.create("u1", "a@example.com");
        let token2 = store.create("u2", "b@example.com");

        assert_ne!(token1, token2);
        assert_eq!(token1.len(), 43); // 32 bytes base64url = 43 chars
    }

    #[test]
    fn test_session_is_reusable() {
        let store = SessionStore::new(10);
        let token = store.create("u1", "test@example.com");

        let first = store.validate(&token).unwrap();
        let second = store.validate(&token).unwrap();

        assert_eq!(first.user_id, "u1");
        assert_eq!(second.email, "test@example.com");
    }

    #[test]
    fn test_validate_unknown_token() {
        let store = SessionStore::new(10);
        assert!(store.validate("nonexistent-token").is_none());
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let store = SessionStore::with_ttl(Duration::from_secs(0));
        let token = store.create("u1", "test@example.com");

        thread::sleep(Duration::from_millis(10));

        assert!(store.validate(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_revoke() {
        let store = SessionStore::new(10);
        let token = store.create("u1", "test@example.com");

        assert!(store.revoke(&token));
        assert!(!store.revoke(&token));
        assert!(store.validate(&token).is_none());
    }

    #[test]
    fn test_cleanup_expired() {
        let short = SessionStore::with_ttl(Duration::from_secs(0));
        short.create("u1", "a@example.com");
        short.create("u2", "b@example.com");

        thread::sleep(Duration::from_millis(10));

        assert_eq!(short.len(), 2);
        assert_eq!(short.cleanup_expired(), 2);
        assert!(short.is_empty());
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();

        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
