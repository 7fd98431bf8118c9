//! Device identity collection and device code derivation.
//!
//! Collects host identity signals (hostname, machine id, CPU model, MAC
//! address, platform, container id) and compresses them into a short,
//! human-transcribable device code used as the license-binding key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;

/// Bumped whenever the derivation algorithm changes.
///
/// Clients that cache a derived code must store this value alongside it and
/// discard the cached code when the versions differ, forcing regeneration
/// instead of comparing codes produced by different algorithm versions.
pub const DERIVATION_VERSION: u32 = 2;

/// Prefix for codes derived from hardware signals.
const HARDWARE_PREFIX: &str = "SRV";

/// Prefix for timestamp-seeded fallback codes.
const FALLBACK_PREFIX: &str = "HOST";

/// Separator used when joining signals before hashing.
const SIGNAL_SEPARATOR: &str = "|";

/// Host identity signals, each independently optional.
///
/// Every probe is independently fallible: a failing probe yields `None` for
/// that signal, never an overall failure. Signals are joined in field order
/// when deriving a device code, so the field order here is part of the
/// derivation algorithm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSignals {
    /// Machine hostname.
    pub hostname: Option<String>,
    /// OS machine id (`/etc/machine-id`, falling back to the dbus copy).
    pub machine_id: Option<String>,
    /// CPU model string.
    pub cpu_model: Option<String>,
    /// Lexicographically-first non-loopback MAC address.
    pub mac_address: Option<String>,
    /// OS name and architecture.
    pub platform: Option<String>,
    /// Container id when running inside a Docker-style container.
    pub container_id: Option<String>,
}

impl DeviceSignals {
    /// Collects the best-available snapshot of host identity.
    ///
    /// Never fails: each probe degrades to `None` on error. All probes are
    /// direct OS reads (files, libc hostname) with bounded latency; no
    /// subprocesses are spawned.
    #[must_use]
    pub fn collect() -> Self {
        Self {
            hostname: get_hostname(),
            machine_id: get_machine_id(),
            cpu_model: get_cpu_model(),
            mac_address: get_mac_address(),
            platform: Some(format!("{}-{}", env::consts::OS, env::consts::ARCH)),
            container_id: get_container_id(),
        }
    }

    /// Returns the present signal values in derivation order.
    #[must_use]
    pub fn present(&self) -> Vec<&str> {
        [
            &self.hostname,
            &self.machine_id,
            &self.cpu_model,
            &self.mac_address,
            &self.platform,
            &self.container_id,
        ]
        .into_iter()
        .filter_map(|s| s.as_deref())
        .filter(|s| !s.is_empty())
        .collect()
    }

    /// Returns true if no signal is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present().is_empty()
    }
}

/// How a device code was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivationMethod {
    /// Derived from stable hardware signals.
    Hardware,
    /// Timestamp-seeded fallback; unstable across restarts.
    Fallback,
}

/// A derived device code, e.g. `SRV-AB12-CD34-EF56`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCode {
    code: String,
    method: DerivationMethod,
}

impl DeviceCode {
    /// Derives a device code from the given signals.
    ///
    /// Present signals are joined with `|` in field order and hashed with
    /// SHA-256; the first 12 hex characters of the digest, uppercased and
    /// grouped 4-4-4, form the code body. The same signal set always yields
    /// the same code.
    ///
    /// When no signal is present the joined string is never hashed; the
    /// fallback branch seeds the digest from the hostname and the current
    /// time instead, and the result is tagged [`DerivationMethod::Fallback`]
    /// so callers can warn that the code is unstable.
    #[must_use]
    pub fn derive(signals: &DeviceSignals) -> Self {
        let joined = signals.present().join(SIGNAL_SEPARATOR);
        if joined.is_empty() {
            return Self::fallback();
        }
        Self {
            code: format_code(HARDWARE_PREFIX, &joined),
            method: DerivationMethod::Hardware,
        }
    }

    /// Derives the device code for the current host.
    #[must_use]
    pub fn current() -> Self {
        Self::derive(&DeviceSignals::collect())
    }

    fn fallback() -> Self {
        let hostname = get_hostname().unwrap_or_else(|| "unknown".to_string());
        let millis = chrono::Utc::now().timestamp_millis();
        let seed = format!("{hostname}{SIGNAL_SEPARATOR}{millis}");
        Self {
            code: format_code(FALLBACK_PREFIX, &seed),
            method: DerivationMethod::Fallback,
        }
    }

    /// Returns the code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Returns how the code was derived.
    #[must_use]
    pub fn method(&self) -> DerivationMethod {
        self.method
    }
}

impl std::fmt::Display for DeviceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// Hashes `input` and formats the digest prefix as `PREFIX-XXXX-XXXX-XXXX`.
fn format_code(prefix: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hex::encode(hasher.finalize());
    let body = digest[..12].to_ascii_uppercase();
    format!("{prefix}-{}-{}-{}", &body[..4], &body[4..8], &body[8..12])
}

/// Maps an empty or whitespace-only probe result to `None`.
fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Gets the machine hostname.
fn get_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .and_then(non_empty)
}

/// Gets the machine id (platform-specific stable identifier).
fn get_machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .and_then(non_empty)
    }

    #[cfg(not(target_os = "linux"))]
    {
        // Non-Linux hosts fall back to the remaining signals.
        None
    }
}

/// Gets the CPU model string.
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
            .and_then(non_empty)
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Gets the lexicographically-first non-loopback MAC address.
///
/// Enumeration order of network interfaces differs between runs; sorting the
/// candidate addresses and taking the first keeps the derived code stable.
fn get_mac_address() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let entries = std::fs::read_dir("/sys/class/net").ok()?;
        let mut macs: Vec<String> = entries
            .flatten()
            .filter(|e| e.file_name().to_string_lossy() != "lo")
            .filter_map(|e| {
                std::fs::read_to_string(e.path().join("address"))
                    .ok()
                    .map(|a| a.trim().to_lowercase())
            })
            .filter(|a| !a.is_empty() && a != "00:00:00:00:00:00")
            .collect();
        macs.sort();
        macs.into_iter().next()
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Gets the container id when running inside a Docker-style container.
///
/// Looks for a 64-hex-char id in the control-group path, falling back to a
/// 12-hex-char hostname (Docker's default), else absent.
fn get_container_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(cgroup) = std::fs::read_to_string("/proc/self/cgroup") {
            for segment in cgroup.split(&['/', '\n'][..]) {
                if segment.len() == 64 && segment.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Some(segment[..12].to_string());
                }
            }
        }
        get_hostname().filter(|h| h.len() == 12 && h.chars().all(|c| c.is_ascii_hexdigit()))
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
