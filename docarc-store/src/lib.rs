//! License persistence and validation for DocArc.
//!
//! - SQLite-backed license record store (one row per licensed device)
//! - Short-TTL in-memory validity cache with an injected clock
//! - [`LicenseService`] facade wiring store, cache and activation protocol
//!
//! The store is the source of truth; the cache is a bounded-staleness
//! optimization invalidated on every write.

mod cache;
mod error;
mod service;
mod store;

pub use cache::{CachedStatus, Clock, StatusCache, SystemClock, DEFAULT_KEY, DEFAULT_TTL_SECS};
pub use error::{StoreError, StoreResult};
pub use service::{Audit, LicenseCheck, LicenseService, LicenseSummary};
pub use store::{License, LicenseStore, NewLicense};
