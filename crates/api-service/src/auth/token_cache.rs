//! Short-lived cache of verified bearer tokens.
//!
//! Keys are the SHA-256 digest of the token, so raw tokens are never held in
//! the map. Each entry lives for the configured TTL or until the token's own
//! validity window closes, whichever comes first. Expired entries are never
//! returned and are purged lazily.

use common::jwt::UserClaims;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Entry count above which an insert sweeps out expired entries.
const PURGE_THRESHOLD: usize = 1024;

struct CachedClaims {
    claims: UserClaims,
    expires_at: Instant,
}

pub struct TokenCache {
    entries: RwLock<HashMap<String, CachedClaims>>,
    ttl: Duration,
}

fn cache_key(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Claims for a previously verified token, if its entry is still live.
    pub async fn get(&self, token: &str) -> Option<UserClaims> {
        let key = cache_key(token);

        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.claims.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it while we are here
        let mut entries = self.entries.write().await;
        if entries
            .get(&key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(&key);
        }
        None
    }

    /// Cache verified claims for at most `min(ttl, lifetime)`.
    pub async fn insert(&self, token: &str, claims: UserClaims, lifetime: Duration) {
        let ttl = self.ttl.min(lifetime);
        if ttl.is_zero() {
            return;
        }

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if entries.len() >= PURGE_THRESHOLD {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        entries.insert(
            cache_key(token),
            CachedClaims {
                claims,
                expires_at: now + ttl,
            },
        );
    }

    /// Drop every entry. Subsequent lookups fall back to full verification.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of entries held, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
