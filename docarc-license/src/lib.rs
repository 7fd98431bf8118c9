//! Device-bound licensing for DocArc.
//!
//! This crate handles:
//! - Host identity collection and device code derivation
//! - Activation code issue/verification via keyed HMAC
//!
//! # Design Principles
//!
//! - **Offline verification**: codes are checked against a recomputed HMAC,
//!   no network round-trip and no shared mutable state beyond the secret
//! - **Device binding**: an activation code is bound to one device code and
//!   never validates for another
//! - **Graceful degradation**: identity probes never fail hard; with no
//!   usable signal the derivation falls back to a timestamp-seeded code
//!   tagged as unstable
//!
//! # Device Code Format
//!
//! `SRV-XXXX-XXXX-XXXX` (hardware-derived) or `HOST-XXXX-XXXX-XXXX`
//! (fallback): the first 12 hex characters of a SHA-256 digest over the
//! joined identity signals, uppercased and grouped for transcription.

mod authcode;
mod device;
mod error;

pub use authcode::{ActivationSecret, MAX_DURATION_DAYS};
pub use device::{DerivationMethod, DeviceCode, DeviceSignals, DERIVATION_VERSION};
pub use error::{LicenseError, LicenseResult};
