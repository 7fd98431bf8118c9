//! Shared test helpers for store and service tests.

#![allow(dead_code)]

use docarc_license::ActivationSecret;
use docarc_store::{Clock, LicenseService, LicenseStore};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A manually-advanced clock so tests can cross TTL and expiry boundaries
/// without sleeping.
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn test_secret() -> ActivationSecret {
    ActivationSecret::new(b"store-test-secret".to_vec()).unwrap()
}

/// Builds a service over an in-memory store with a manual clock at `now`.
pub fn service_at(now: i64) -> (Arc<ManualClock>, LicenseService) {
    let clock = ManualClock::at(now);
    let store = LicenseStore::open_in_memory().unwrap();
    let service = LicenseService::with_clock(store, test_secret(), clock.clone());
    (clock, service)
}
