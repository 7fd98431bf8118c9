//! License service facade: validation, activation and admin CRUD.
//!
//! Wires the record store, the status cache and the activation code
//! protocol together. Every mutation invalidates the affected cache keys
//! before returning; staleness there would cause either premature lockout
//! or an expired license appearing valid for up to the TTL window.

use crate::cache::{CachedStatus, Clock, StatusCache, SystemClock, DEFAULT_KEY, DEFAULT_TTL_SECS};
use crate::error::{StoreError, StoreResult};
use crate::store::{License, LicenseStore, NewLicense};
use docarc_license::{ActivationSecret, DeviceCode};
use serde::Serialize;
use std::sync::Arc;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Who performed a mutating call, passed explicitly by the caller.
///
/// Operator identity and origin are never read from ambient state; the
/// HTTP layer extracts them from the request and hands them down.
#[derive(Debug, Clone, Copy)]
pub struct Audit<'a> {
    pub operator: &'a str,
    pub ip: Option<&'a str>,
}

/// Outcome of a validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LicenseCheck {
    pub valid: bool,
    pub expire_time: Option<i64>,
}

/// A license with its activity flag, computed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseSummary {
    #[serde(flatten)]
    pub license: License,
    pub is_active: bool,
}

/// The license service gating application access.
pub struct LicenseService {
    store: LicenseStore,
    cache: StatusCache,
    secret: ActivationSecret,
    clock: Arc<dyn Clock>,
}

impl LicenseService {
    /// Creates a service over the given store and secret with the system
    /// clock and default TTL.
    #[must_use]
    pub fn new(store: LicenseStore, secret: ActivationSecret) -> Self {
        Self::with_clock(store, secret, Arc::new(SystemClock))
    }

    /// Creates a service with an injected clock; the cache shares it.
    #[must_use]
    pub fn with_clock(store: LicenseStore, secret: ActivationSecret, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache: StatusCache::new(DEFAULT_TTL_SECS, Arc::clone(&clock)),
            secret,
            clock,
        }
    }

    /// Checks current validity for a device.
    ///
    /// A cache entry younger than the TTL is returned without touching the
    /// store. Otherwise the store is queried, the decision written through
    /// and returned. When no device code is supplied the code derived for
    /// the current host is used, cached under a default key.
    ///
    /// # Errors
    ///
    /// A store read failure propagates and is never cached, so failures
    /// degrade to denial rather than silent bypass.
    pub fn check(&self, device_code: Option<&str>) -> StoreResult<LicenseCheck> {
        let key = device_code.unwrap_or(DEFAULT_KEY);
        if let Some(hit) = self.cache.get(key) {
            return Ok(LicenseCheck {
                valid: hit.valid,
                expire_time: hit.expire_time,
            });
        }

        let derived;
        let device = match device_code {
            Some(code) => code,
            None => {
                derived = DeviceCode::current();
                derived.as_str()
            }
        };

        let now = self.clock.now();
        let check = match self.store.find_by_device(device)? {
            Some(license) => LicenseCheck {
                valid: license.is_active(now),
                expire_time: Some(license.expire_time),
            },
            None => LicenseCheck {
                valid: false,
                expire_time: None,
            },
        };
        self.cache.put(
            key,
            CachedStatus {
                valid: check.valid,
                expire_time: check.expire_time,
            },
        );
        Ok(check)
    }

    /// End-user self-activation with an offline-issued code.
    ///
    /// The code is verified against the claimed device code first. When no
    /// license row exists one is recorded with `expire = now + duration`;
    /// when one exists the submitted code must equal the stored one, and
    /// re-activation is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidActivation`] on any verification
    /// failure, with no further detail.
    pub fn activate(
        &self,
        device_code: &str,
        auth_code: &str,
        audit: Audit<'_>,
    ) -> StoreResult<License> {
        let Some(duration_days) = self.secret.verify(device_code, auth_code) else {
            return Err(StoreError::InvalidActivation);
        };

        let license = match self.store.find_by_device(device_code)? {
            Some(existing) => {
                if existing.auth_code != auth_code.trim() {
                    return Err(StoreError::InvalidActivation);
                }
                existing
            }
            None => {
                let now = self.clock.now();
                self.store.create(&NewLicense {
                    device_code,
                    auth_code: auth_code.trim(),
                    expire_time: now + i64::from(duration_days) * SECS_PER_DAY,
                    created_at: now,
                    name: None,
                })?
            }
        };

        self.invalidate(device_code);
        self.log_audit("license activated", device_code, audit);
        Ok(license)
    }

    /// Admin issuance: computes the activation code and inserts the row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateDevice`] when the device is already
    /// bound and a `LicenseError` for an out-of-range duration.
    pub fn create(
        &self,
        device_code: &str,
        duration_days: u32,
        name: Option<&str>,
        audit: Audit<'_>,
    ) -> StoreResult<License> {
        let auth_code = self.secret.issue(device_code, duration_days)?;
        let now = self.clock.now();
        let license = self.store.create(&NewLicense {
            device_code,
            auth_code: &auth_code,
            expire_time: now + i64::from(duration_days) * SECS_PER_DAY,
            created_at: now,
            name,
        })?;
        self.invalidate(device_code);
        self.log_audit("license created", device_code, audit);
        Ok(license)
    }

    /// Extends a license from its current expiry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub fn renew(&self, id: &str, additional_days: u32, audit: Audit<'_>) -> StoreResult<License> {
        let license = self.store.renew(id, additional_days)?;
        self.invalidate(&license.device_code);
        self.log_audit("license renewed", &license.device_code, audit);
        Ok(license)
    }

    /// Removes a license, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub fn delete(&self, id: &str, audit: Audit<'_>) -> StoreResult<License> {
        let license = self.store.delete(id)?;
        self.invalidate(&license.device_code);
        self.log_audit("license deleted", &license.device_code, audit);
        Ok(license)
    }

    /// Lists all licenses with `is_active` computed at read time.
    pub fn list(&self) -> StoreResult<Vec<LicenseSummary>> {
        let now = self.clock.now();
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(|license| {
                let is_active = license.is_active(now);
                LicenseSummary { license, is_active }
            })
            .collect())
    }

    /// Drops every cached validity decision.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Invalidates both the per-device key and the default key.
    ///
    /// The default key may alias the mutated device (it caches the current
    /// host's own code), so it is dropped on every mutation.
    fn invalidate(&self, device_code: &str) {
        self.cache.invalidate(device_code);
        self.cache.invalidate(DEFAULT_KEY);
    }

    fn log_audit(&self, action: &str, device_code: &str, audit: Audit<'_>) {
        tracing::info!(
            target: "audit",
            operator = audit.operator,
            ip = audit.ip.unwrap_or("-"),
            device = device_code,
            "{action}"
        );
    }
}
