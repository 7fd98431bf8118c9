mod common;

use common::ManualClock;
use docarc_store::{CachedStatus, StatusCache, DEFAULT_KEY, DEFAULT_TTL_SECS};

const T0: i64 = 1_700_000_000;

fn valid_until(expire: i64) -> CachedStatus {
    CachedStatus {
        valid: true,
        expire_time: Some(expire),
    }
}

#[test]
fn get_returns_fresh_entry() {
    let clock = ManualClock::at(T0);
    let cache = StatusCache::new(DEFAULT_TTL_SECS, clock.clone());
    cache.put("SRV-AB12-CD34-EF56", valid_until(T0 + 1000));
    assert_eq!(
        cache.get("SRV-AB12-CD34-EF56"),
        Some(valid_until(T0 + 1000))
    );
}

#[test]
fn missing_key_is_absent() {
    let clock = ManualClock::at(T0);
    let cache = StatusCache::new(DEFAULT_TTL_SECS, clock);
    assert_eq!(cache.get("SRV-AB12-CD34-EF56"), None);
}

#[test]
fn entry_expires_at_ttl() {
    let clock = ManualClock::at(T0);
    let cache = StatusCache::new(DEFAULT_TTL_SECS, clock.clone());
    cache.put(DEFAULT_KEY, valid_until(T0 + 1000));

    clock.advance(DEFAULT_TTL_SECS - 1);
    assert!(cache.get(DEFAULT_KEY).is_some());

    clock.advance(1);
    assert_eq!(cache.get(DEFAULT_KEY), None);
}

#[test]
fn invalidate_drops_only_that_key() {
    let clock = ManualClock::at(T0);
    let cache = StatusCache::new(DEFAULT_TTL_SECS, clock);
    cache.put("a", valid_until(T0 + 1));
    cache.put("b", valid_until(T0 + 2));
    cache.invalidate("a");
    assert_eq!(cache.get("a"), None);
    assert!(cache.get("b").is_some());
}

#[test]
fn clear_drops_everything() {
    let clock = ManualClock::at(T0);
    let cache = StatusCache::new(DEFAULT_TTL_SECS, clock);
    cache.put("a", valid_until(T0 + 1));
    cache.put("b", valid_until(T0 + 2));
    cache.clear();
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), None);
}

#[test]
fn put_refreshes_age_and_value() {
    let clock = ManualClock::at(T0);
    let cache = StatusCache::new(DEFAULT_TTL_SECS, clock.clone());
    cache.put("a", valid_until(T0 + 1));
    clock.advance(DEFAULT_TTL_SECS - 10);
    cache.put(
        "a",
        CachedStatus {
            valid: false,
            expire_time: None,
        },
    );
    clock.advance(20);
    // Old entry would have aged out; the rewrite keeps it live.
    assert_eq!(
        cache.get("a"),
        Some(CachedStatus {
            valid: false,
            expire_time: None,
        })
    );
}

#[test]
fn negative_status_is_cached_too() {
    let clock = ManualClock::at(T0);
    let cache = StatusCache::new(DEFAULT_TTL_SECS, clock);
    cache.put(
        "unknown-device",
        CachedStatus {
            valid: false,
            expire_time: None,
        },
    );
    let hit = cache.get("unknown-device").unwrap();
    assert!(!hit.valid);
    assert_eq!(hit.expire_time, None);
}
