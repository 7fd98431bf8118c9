use docarc_license::{ActivationSecret, LicenseError, MAX_DURATION_DAYS};

const DEVICE_A: &str = "SRV-AB12-CD34-EF56";
const DEVICE_B: &str = "SRV-1111-2222-3333";

fn secret() -> ActivationSecret {
    ActivationSecret::new(b"test-activation-secret".to_vec()).unwrap()
}

#[test]
fn issue_is_deterministic() {
    let s = secret();
    let a = s.issue(DEVICE_A, 30).unwrap();
    let b = s.issue(DEVICE_A, 30).unwrap();
    assert_eq!(a, b);
}

#[test]
fn code_shape() {
    let code = secret().issue(DEVICE_A, 30).unwrap();
    let groups: Vec<&str> = code.split('-').collect();
    assert_eq!(groups.len(), 4);
    for group in &groups {
        assert_eq!(group.len(), 4);
        assert!(group.chars().all(|c| c.is_ascii_hexdigit()));
    }
    // First group carries the duration.
    assert_eq!(u32::from_str_radix(groups[0], 16).unwrap(), 30);
}

#[test]
fn round_trip_recovers_duration() {
    let s = secret();
    for days in [1, 7, 30, 90, 365, 1000, MAX_DURATION_DAYS] {
        let code = s.issue(DEVICE_A, days).unwrap();
        assert_eq!(s.verify(DEVICE_A, &code), Some(days), "days = {days}");
    }
}

#[test]
fn code_is_bound_to_its_device() {
    let s = secret();
    let code_for_b = s.issue(DEVICE_B, 30).unwrap();
    assert_eq!(s.verify(DEVICE_B, &code_for_b), Some(30));
    assert_eq!(s.verify(DEVICE_A, &code_for_b), None);
}

#[test]
fn tampered_tag_is_rejected() {
    let s = secret();
    let code = s.issue(DEVICE_A, 30).unwrap();
    let mut chars: Vec<char> = code.chars().collect();
    let last = chars.len() - 1;
    chars[last] = if chars[last] == '0' { '1' } else { '0' };
    let tampered: String = chars.into_iter().collect();
    assert_eq!(s.verify(DEVICE_A, &tampered), None);
}

#[test]
fn tampered_duration_is_rejected() {
    let s = secret();
    let code = s.issue(DEVICE_A, 30).unwrap();
    // Claim a longer duration while keeping the original tag.
    let forged = format!("{:04X}-{}", 365, &code[5..]);
    assert_eq!(s.verify(DEVICE_A, &forged), None);
}

#[test]
fn wrong_secret_is_rejected() {
    let code = secret().issue(DEVICE_A, 30).unwrap();
    let other = ActivationSecret::new(b"another-secret".to_vec()).unwrap();
    assert_eq!(other.verify(DEVICE_A, &code), None);
}

#[test]
fn verify_tolerates_surrounding_whitespace() {
    let s = secret();
    let code = s.issue(DEVICE_A, 30).unwrap();
    assert_eq!(s.verify(DEVICE_A, &format!("  {code}  ")), Some(30));
}

#[test]
fn malformed_codes_are_rejected() {
    let s = secret();
    for bad in [
        "",
        "not-a-code",
        "0000-0000-0000-0000",
        "001E-AAAA-BBBB",
        "001E-AAAA-BBBB-CCCC-DDDD",
        "ZZZZ-AAAA-BBBB-CCCC",
        "001E.AAAA.BBBB.CCCC",
    ] {
        assert_eq!(s.verify(DEVICE_A, bad), None, "accepted: {bad:?}");
    }
}

#[test]
fn zero_duration_rejected_on_issue() {
    let err = secret().issue(DEVICE_A, 0).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidDuration(0)));
}

#[test]
fn excessive_duration_rejected_on_issue() {
    let err = secret().issue(DEVICE_A, MAX_DURATION_DAYS + 1).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidDuration(_)));
}

#[test]
fn empty_secret_rejected() {
    let err = ActivationSecret::new(Vec::new()).unwrap_err();
    assert!(matches!(err, LicenseError::EmptySecret));
}

#[test]
fn different_durations_yield_different_codes() {
    let s = secret();
    let a = s.issue(DEVICE_A, 30).unwrap();
    let b = s.issue(DEVICE_A, 31).unwrap();
    assert_ne!(a, b);
}
