//! Activation code issue and verification.
//!
//! An activation code binds a device code to a validity duration through a
//! keyed one-way construction, so a license issuer holding the secret can
//! compute codes offline and a validator can check them without any shared
//! database state.
//!
//! # Code format
//!
//! `DDDD-XXXX-XXXX-XXXX` — all uppercase hex. `DDDD` is the duration in
//! days; the remaining 12 characters are the first 6 bytes of
//! `HMAC-SHA256(secret, device_code|DDDD|v1)`. Verification parses the
//! duration back out, recomputes the tag and compares in constant time.
//!
//! Binding the device code into the tag is the core security invariant of
//! the license subsystem: a code issued for machine B never activates
//! machine A, and forging a code without the secret is computationally
//! infeasible.

use crate::error::{LicenseError, LicenseResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum issuable duration (10 years).
pub const MAX_DURATION_DAYS: u32 = 3650;

/// Tag truncation length in bytes (12 hex characters on the wire).
const TAG_BYTES: usize = 6;

/// Mixed into the tag so a future format change invalidates old codes.
const PROTOCOL_VERSION: &[u8] = b"v1";

/// The server-held secret used to issue and verify activation codes.
pub struct ActivationSecret {
    secret: Vec<u8>,
}

impl ActivationSecret {
    /// Wraps the server secret.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::EmptySecret`] for an empty secret, which
    /// would make every code forgeable.
    pub fn new(secret: impl Into<Vec<u8>>) -> LicenseResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(LicenseError::EmptySecret);
        }
        Ok(Self { secret })
    }

    /// Issues an activation code for `device_code` valid for `duration_days`.
    ///
    /// Deterministic: the same (device code, duration) pair always yields
    /// the same code under the same secret.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidDuration`] when `duration_days` is 0
    /// or exceeds [`MAX_DURATION_DAYS`].
    pub fn issue(&self, device_code: &str, duration_days: u32) -> LicenseResult<String> {
        if duration_days == 0 || duration_days > MAX_DURATION_DAYS {
            return Err(LicenseError::InvalidDuration(duration_days));
        }
        let duration_hex = format!("{duration_days:04X}");
        let tag = self.tag(device_code, &duration_hex);
        let tag_hex = hex::encode_upper(&tag[..TAG_BYTES]);
        Ok(format!(
            "{duration_hex}-{}-{}-{}",
            &tag_hex[..4],
            &tag_hex[4..8],
            &tag_hex[8..12]
        ))
    }

    /// Verifies `auth_code` against `device_code`.
    ///
    /// Returns the bound duration in days on success, `None` on any
    /// mismatch. No failure detail is exposed: a malformed code and a
    /// wrong-device code are indistinguishable to the caller.
    #[must_use]
    pub fn verify(&self, device_code: &str, auth_code: &str) -> Option<u32> {
        let code = auth_code.trim();
        let groups: Vec<&str> = code.split('-').collect();
        if groups.len() != 4 || groups.iter().any(|g| g.len() != 4) {
            return None;
        }
        let duration_days = u32::from_str_radix(groups[0], 16).ok()?;
        if duration_days == 0 || duration_days > MAX_DURATION_DAYS {
            return None;
        }
        let claimed = hex::decode(groups[1..].concat()).ok()?;

        let duration_hex = format!("{duration_days:04X}");
        let expected = self.tag(device_code, &duration_hex);
        if claimed.ct_eq(&expected[..TAG_BYTES]).into() {
            Some(duration_days)
        } else {
            None
        }
    }

    /// Computes the full HMAC tag over `device_code|DDDD|v1`.
    fn tag(&self, device_code: &str, duration_hex: &str) -> Vec<u8> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(device_code.as_bytes());
        mac.update(b"|");
        mac.update(duration_hex.as_bytes());
        mac.update(b"|");
        mac.update(PROTOCOL_VERSION);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for ActivationSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("ActivationSecret").finish_non_exhaustive()
    }
}
