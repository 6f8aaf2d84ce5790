use dashmap::DashMap;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Maximum number of cache entries before eviction kicks in
const MAX_CACHE_ENTRIES: usize = 1000;

/// Farcaster profile lookups stay valid for 5 minutes
pub const PROFILE_TTL: Duration = Duration::from_secs(300);

/// On-chain USDC balance reads stay valid for 30 seconds
pub const BALANCE_TTL: Duration = Duration::from_secs(30);

/// Global cache storage
static CACHE: OnceLock<DashMap<String, CacheEntry>> = OnceLock::new();

/// Cache entry with expiration and access tracking
#[derive(Clone)]
struct CacheEntry {
    data: String,
    expires_at: Instant,
    last_accessed: Instant,
}

fn get_cache() -> &'static DashMap<String, CacheEntry> {
    CACHE.get_or_init(DashMap::new)
}

/// Get cached data if it exists and hasn't expired
pub fn get<T: for<'de> serde::Deserialize<'de>>(key: &str) -> Option<T> {
    let cache = get_cache();

    if let Some(mut entry) = cache.get_mut(key) {
        if Instant::now() < entry.expires_at {
            // Update last accessed time (for LRU tracking)
            entry.last_accessed = Instant::now();

            if let Ok(data) = serde_json::from_str(&entry.data) {
                return Some(data);
            }
        } else {
            // Remove expired entry
            drop(entry);
            cache.remove(key);
        }
    }

    None
}

/// Set cached data with TTL (time to live)
pub fn set<T: Serialize>(key: &str, data: &T, ttl: Duration) -> Result<(), serde_json::Error> {
    let cache = get_cache();

    if cache.len() >= MAX_CACHE_ENTRIES {
        evict_lru_entries();
    }

    let json_data = serde_json::to_string(data)?;
    let now = Instant::now();

    let entry = CacheEntry {
        data: json_data,
        expires_at: now + ttl,
        last_accessed: now,
    };

    cache.insert(key.to_string(), entry);
    Ok(())
}

/// Evict least recently used entries to free up space
/// Removes 20% of entries (sorted by last_accessed time)
fn evict_lru_entries() {
    let cache = get_cache();
    let current_size = cache.len();
    let target_remove = current_size / 5;

    if target_remove == 0 {
        return;
    }

    let mut entries: Vec<(String, Instant)> = cache
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().last_accessed))
        .collect();

    entries.sort_by_key(|(_, last_accessed)| *last_accessed);

    for (key, _) in entries.iter().take(target_remove) {
        cache.remove(key);
    }

    tracing::info!(
        "Cache eviction: removed {} LRU entries (cache size: {} -> {})",
        target_remove,
        current_size,
        cache.len()
    );
}

pub fn profile_key(fid: i64) -> String {
    format!("farcaster:user:{}", fid)
}

pub fn balance_key(address: &str) -> String {
    format!("usdc:balance:{}", address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        set("test:roundtrip", &vec![1, 2, 3], Duration::from_secs(60)).unwrap();
        let cached: Option<Vec<i32>> = get("test:roundtrip");
        assert_eq!(cached, Some(vec![1, 2, 3]));
    }

    #[test]
    fn miss_on_unknown_key() {
        let cached: Option<String> = get("test:never-set");
        assert!(cached.is_none());
    }

    #[test]
    fn expires() {
        set("test:expires", &"value".to_string(), Duration::from_millis(1)).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        let cached: Option<String> = get("test:expires");
        assert!(cached.is_none());
    }
}
