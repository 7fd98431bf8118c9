use docarc_license::{DerivationMethod, DeviceCode, DeviceSignals, DERIVATION_VERSION};

fn sample_signals() -> DeviceSignals {
    DeviceSignals {
        hostname: Some("archive-host".to_string()),
        machine_id: Some("4c4c4544-0042-3510-8036-b4c04f4e4d31".to_string()),
        cpu_model: Some("Intel(R) Xeon(R) CPU E5-2680 v4".to_string()),
        mac_address: Some("02:42:ac:11:00:02".to_string()),
        platform: Some("linux-x86_64".to_string()),
        container_id: None,
    }
}

fn assert_code_shape(code: &str, prefix: &str) {
    let parts: Vec<&str> = code.split('-').collect();
    assert_eq!(parts[0], prefix);
    assert_eq!(parts.len(), 4);
    for group in &parts[1..] {
        assert_eq!(group.len(), 4);
        assert!(
            group.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()),
            "group not uppercase hex: {group}"
        );
    }
}

#[test]
fn collection_never_fails() {
    let signals = DeviceSignals::collect();
    // The platform probe cannot fail, so the hardware path is always open.
    assert!(!signals.is_empty());
    assert!(signals.platform.is_some());
}

#[test]
fn derivation_is_deterministic() {
    let signals = sample_signals();
    let a = DeviceCode::derive(&signals);
    let b = DeviceCode::derive(&signals);
    assert_eq!(a, b);
    assert_eq!(a.as_str(), b.as_str());
}

#[test]
fn hardware_code_shape() {
    let code = DeviceCode::derive(&sample_signals());
    assert_eq!(code.method(), DerivationMethod::Hardware);
    assert_code_shape(code.as_str(), "SRV");
}

#[test]
fn current_host_code_is_stable() {
    let a = DeviceCode::current();
    let b = DeviceCode::current();
    assert_eq!(a.as_str(), b.as_str());
    assert_eq!(a.method(), DerivationMethod::Hardware);
}

#[test]
fn empty_signals_fall_back() {
    let code = DeviceCode::derive(&DeviceSignals::default());
    assert_eq!(code.method(), DerivationMethod::Fallback);
    assert_code_shape(code.as_str(), "HOST");
}

#[test]
fn empty_strings_count_as_absent() {
    let signals = DeviceSignals {
        hostname: Some(String::new()),
        machine_id: Some(String::new()),
        cpu_model: None,
        mac_address: Some(String::new()),
        platform: None,
        container_id: None,
    };
    assert!(signals.is_empty());
    let code = DeviceCode::derive(&signals);
    assert_eq!(code.method(), DerivationMethod::Fallback);
}

#[test]
fn different_signals_yield_different_codes() {
    let a = DeviceCode::derive(&sample_signals());
    let mut other = sample_signals();
    other.machine_id = Some("aaaaaaaa-0000-0000-0000-000000000000".to_string());
    let b = DeviceCode::derive(&other);
    assert_ne!(a.as_str(), b.as_str());
}

#[test]
fn dropping_a_signal_changes_the_code() {
    let full = DeviceCode::derive(&sample_signals());
    let mut partial = sample_signals();
    partial.mac_address = None;
    let reduced = DeviceCode::derive(&partial);
    assert_ne!(full.as_str(), reduced.as_str());
}

#[test]
fn single_signal_is_enough_for_hardware_path() {
    let signals = DeviceSignals {
        hostname: Some("solo".to_string()),
        ..DeviceSignals::default()
    };
    let code = DeviceCode::derive(&signals);
    assert_eq!(code.method(), DerivationMethod::Hardware);
}

#[test]
fn present_signals_keep_field_order() {
    let signals = sample_signals();
    let present = signals.present();
    assert_eq!(present[0], "archive-host");
    assert_eq!(present[4], "linux-x86_64");
    assert_eq!(present.len(), 5);
}

#[test]
fn derivation_version_is_exposed() {
    // Contract for client-side caches: a stored code must be keyed by this.
    assert!(DERIVATION_VERSION >= 1);
}

#[test]
fn signals_serde_roundtrip() {
    let signals = sample_signals();
    let json = serde_json::to_string(&signals).unwrap();
    let parsed: DeviceSignals = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, signals);
}

#[test]
fn method_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&DerivationMethod::Fallback).unwrap(),
        "\"fallback\""
    );
    assert_eq!(
        serde_json::to_string(&DerivationMethod::Hardware).unwrap(),
        "\"hardware\""
    );
}

#[test]
fn device_code_display_matches_as_str() {
    let code = DeviceCode::derive(&sample_signals());
    assert_eq!(code.to_string(), code.as_str());
}
