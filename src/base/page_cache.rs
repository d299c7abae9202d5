//! Time-boxed cache of rendered pages, persisted in the key-value store.
//!
//! Entries are keyed by prefix and request URI and are only dropped by expiry
//! or by [`PageCache::clear`]; writes elsewhere never invalidate them, so a
//! cached page can lag behind new posts for up to one TTL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::base::store::KvStore;
use crate::config::{cache_key, index_cache_ttl, CACHE_KEYS_KEY, INDEX_CACHE_PREFIX};

#[derive(Serialize, Deserialize)]
struct CachedPage {
    body: String,
    expires_at: DateTime<Utc>,
}

pub struct PageCache {
    prefix: &'static str,
    ttl: Duration,
}

impl PageCache {
    pub fn new(prefix: &'static str, ttl: Duration) -> Self {
        Self { prefix, ttl }
    }

    /// The cache in front of the home feed.
    pub fn index() -> Self {
        Self::new(INDEX_CACHE_PREFIX, index_cache_ttl())
    }

    pub fn get(&self, store: &impl KvStore, uri: &str) -> anyhow::Result<Option<String>> {
        self.get_at(store, uri, Utc::now())
    }

    pub fn get_at(
        &self,
        store: &impl KvStore,
        uri: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<String>> {
        let key = cache_key(self.prefix, uri);
        match store.get_json::<CachedPage>(&key)? {
            Some(page) if page.expires_at > now => Ok(Some(page.body)),
            Some(_) => {
                store.delete(&key)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn put(&self, store: &impl KvStore, uri: &str, body: &str) -> anyhow::Result<()> {
        self.put_at(store, uri, body, Utc::now())
    }

    pub fn put_at(
        &self,
        store: &impl KvStore,
        uri: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if self.ttl <= Duration::zero() {
            return Ok(());
        }
        let key = cache_key(self.prefix, uri);
        let page = CachedPage {
            body: body.to_string(),
            expires_at: now + self.ttl,
        };
        store.set_json(&key, &page)?;

        let mut keys = store.get_list(CACHE_KEYS_KEY)?;
        if !keys.contains(&key) {
            keys.push(key);
            store.set_json(CACHE_KEYS_KEY, &keys)?;
        }
        Ok(())
    }
}

/// Drops every cached page regardless of prefix.
pub fn clear(store: &impl KvStore) -> anyhow::Result<()> {
    for key in store.get_list(CACHE_KEYS_KEY)? {
        store.delete(&key)?;
    }
    store.delete(CACHE_KEYS_KEY)?;
    log::debug!("page cache cleared");
    Ok(())
}
