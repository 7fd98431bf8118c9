use docarc_license::{ActivationSecret, LicenseError};

#[test]
fn invalid_duration_message() {
    let err = LicenseError::InvalidDuration(0);
    assert_eq!(err.to_string(), "invalid duration: 0 days (expected 1..=3650)");
}

#[test]
fn empty_secret_message() {
    let err = LicenseError::EmptySecret;
    assert_eq!(err.to_string(), "activation secret must not be empty");
}

#[test]
fn secret_debug_hides_key_material() {
    let secret = ActivationSecret::new(b"super-secret-key".to_vec()).unwrap();
    let debug = format!("{secret:?}");
    assert!(!debug.contains("super-secret-key"));
}
