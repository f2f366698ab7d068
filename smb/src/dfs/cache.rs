use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use smb_core::logging::trace;

use crate::dfs::referral::ReferralData;

#[derive(Debug, Clone)]
struct CacheEntry {
    prefix: String,
    referral: ReferralData,
    expires: Instant,
}

/// A cached referral together with the path prefix it was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHit {
    pub prefix: String,
    pub referral: ReferralData,
}

/// Referrals keyed by (domain or server, share, path prefix).
///
/// Names compare case-insensitively and `/` is the same separator as `\`.
/// Lookup picks the longest stored prefix that covers the queried path on a
/// component boundary; an empty prefix covers the whole share. Expired entries
/// are dropped when a lookup walks past them. Every operation runs under one
/// lock, so concurrent stores and lookups are applied in a single total order.
#[derive(Debug, Default)]
pub struct ReferralCache {
    entries: Mutex<HashMap<(String, String), Vec<CacheEntry>>>,
}

impl ReferralCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, domain_or_server: &str, share: &str, path: &str) -> Option<ReferralData> {
        self.lookup_entry(domain_or_server, share, path).map(|hit| hit.referral)
    }

    pub fn lookup_entry(&self, domain_or_server: &str, share: &str, path: &str) -> Option<CacheHit> {
        let key = cache_key(domain_or_server, share);
        let path = normalize_path(path);
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let candidates = entries.get_mut(&key)?;

        let before = candidates.len();
        candidates.retain(|entry| entry.expires > now);
        if candidates.len() != before {
            trace!("evicted {} expired referrals for \\{}\\{}", before - candidates.len(), key.0, key.1);
        }

        let hit = candidates.iter()
            .find(|entry| covers(&entry.prefix, &path))
            .map(|entry| CacheHit {
                prefix: entry.prefix.clone(),
                referral: entry.referral.clone(),
            });
        if candidates.is_empty() {
            entries.remove(&key);
        }
        if let Some(hit) = &hit {
            trace!("referral cache hit for \\{}\\{}{} under '{}'", key.0, key.1, path, hit.prefix);
        }
        hit
    }

    /// Inserts or replaces the entry for exactly this (domain or server, share, path).
    pub fn store(&self, domain_or_server: &str, share: &str, path: &str, referral: ReferralData, ttl: Duration) {
        let key = cache_key(domain_or_server, share);
        let prefix = normalize_path(path);
        let entry = CacheEntry {
            prefix,
            referral,
            expires: Instant::now() + ttl,
        };
        let mut entries = self.entries.lock();
        let candidates = entries.entry(key).or_default();
        candidates.retain(|existing| existing.prefix != entry.prefix);
        let position = candidates.iter()
            .position(|existing| existing.prefix.len() < entry.prefix.len())
            .unwrap_or(candidates.len());
        candidates.insert(position, entry);
    }

    /// Removes the entry stored for exactly this key. Returns whether one existed.
    pub fn invalidate(&self, domain_or_server: &str, share: &str, path: &str) -> bool {
        let key = cache_key(domain_or_server, share);
        let prefix = normalize_path(path);
        let mut entries = self.entries.lock();
        let Some(candidates) = entries.get_mut(&key) else {
            return false;
        };
        let before = candidates.len();
        candidates.retain(|entry| entry.prefix != prefix);
        let removed = candidates.len() != before;
        if candidates.is_empty() {
            entries.remove(&key);
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cache_key(domain_or_server: &str, share: &str) -> (String, String) {
    (domain_or_server.to_lowercase(), share.to_lowercase())
}

/// Lowercase, `\`-separated, leading separator, no trailing separator; the
/// share root is the empty string.
pub(crate) fn normalize_path(path: &str) -> String {
    let path = path.replace('/', "\\").to_lowercase();
    let trimmed = path.trim_matches('\\');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\\{}", trimmed)
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    prefix.is_empty()
        || path == prefix
        || (path.starts_with(prefix) && path[prefix.len()..].starts_with('\\'))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use crate::dfs::referral::ReferralKind;

    use super::*;

    fn referral(server: &str) -> ReferralData {
        ReferralData::new(ReferralKind::Root, server, "share", "", 0, Duration::from_secs(300))
    }

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn lookup_is_case_insensitive() {
        let cache = ReferralCache::new();
        cache.store("EXAMPLE", "Share", "", referral("fs1"), TTL);
        assert_eq!(cache.lookup("example", "SHARE", "").unwrap().server(), "fs1");
    }

    #[test]
    fn longest_prefix_wins_regardless_of_store_order() {
        let cache = ReferralCache::new();
        cache.store("example", "share", "\\projects\\alpha", referral("deep"), TTL);
        cache.store("example", "share", "", referral("root"), TTL);
        cache.store("example", "share", "\\projects", referral("mid"), TTL);

        assert_eq!(cache.lookup("example", "share", "\\projects\\alpha\\src").unwrap().server(), "deep");
        assert_eq!(cache.lookup("example", "share", "/projects/beta").unwrap().server(), "mid");
        assert_eq!(cache.lookup("example", "share", "\\other").unwrap().server(), "root");
        assert_eq!(cache.lookup("example", "share", "").unwrap().server(), "root");
    }

    #[test]
    fn prefix_must_end_on_component_boundary() {
        let cache = ReferralCache::new();
        cache.store("example", "share", "\\proj", referral("proj"), TTL);
        assert!(cache.lookup("example", "share", "\\projects").is_none());
        assert!(cache.lookup("example", "share", "\\proj\\x").is_some());
        assert!(cache.lookup("example", "share", "\\proj\\").is_some());
    }

    #[test]
    fn deep_store_does_not_alias_shallow_lookup() {
        let cache = ReferralCache::new();
        cache.store("example", "share", "\\deep\\path", referral("deep"), TTL);
        assert!(cache.lookup("example", "share", "").is_none());
        cache.store("example", "share", "", referral("root"), TTL);
        assert_eq!(cache.lookup("example", "share", "").unwrap().server(), "root");
        assert_eq!(cache.lookup("example", "share", "\\deep\\path").unwrap().server(), "deep");
    }

    #[test]
    fn expired_entries_are_evicted_on_lookup() {
        let cache = ReferralCache::new();
        cache.store("example", "share", "", referral("stale"), Duration::ZERO);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup("example", "share", "").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_longer_prefix_falls_back_to_shorter() {
        let cache = ReferralCache::new();
        cache.store("example", "share", "", referral("root"), TTL);
        cache.store("example", "share", "\\link", referral("link"), Duration::ZERO);
        assert_eq!(cache.lookup("example", "share", "\\link").unwrap().server(), "root");
    }

    #[test]
    fn store_replaces_same_key() {
        let cache = ReferralCache::new();
        cache.store("example", "share", "\\a", referral("one"), TTL);
        cache.store("EXAMPLE", "share", "\\A\\", referral("two"), TTL);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("example", "share", "\\a").unwrap().server(), "two");
    }

    #[test]
    fn invalidate_removes_only_exact_key() {
        let cache = ReferralCache::new();
        cache.store("example", "share", "", referral("root"), TTL);
        cache.store("example", "share", "\\link", referral("link"), TTL);
        assert!(cache.invalidate("example", "share", "\\LINK"));
        assert!(!cache.invalidate("example", "share", "\\link"));
        assert_eq!(cache.lookup("example", "share", "\\link").unwrap().server(), "root");
    }

    #[test]
    fn hit_reports_matched_prefix() {
        let cache = ReferralCache::new();
        cache.store("example", "share", "", referral("root"), TTL);
        let hit = cache.lookup_entry("example", "share", "\\a\\b").unwrap();
        assert_eq!(hit.prefix, "");
    }

    #[test]
    fn concurrent_stores_keep_ordering() {
        let cache = Arc::new(ReferralCache::new());
        let handles = (0..8).map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let path = "\\d".repeat(i + 1);
                cache.store("example", "share", &path, referral(&format!("fs{}", i)), TTL);
                cache.lookup("example", "share", &path)
            })
        }).collect::<Vec<_>>();
        for handle in handles {
            assert!(handle.join().unwrap().is_some());
        }
        assert_eq!(cache.lookup("example", "share", &"\\d".repeat(8)).unwrap().server(), "fs7");
        assert_eq!(cache.lookup("example", "share", "\\d\\x").unwrap().server(), "fs0");
    }
}
