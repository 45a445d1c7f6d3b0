use std::sync::LazyLock;

use regex::Regex;

static PHONE10_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());
static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static GSTIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").unwrap());
static FSSAI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{14}$").unwrap());
static OTP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}$").unwrap());

/// Any 10-digit phone, as accepted by the admin onboarding flows.
pub fn is_phone10(s: &str) -> bool {
    PHONE10_RE.is_match(s.trim())
}

/// Indian mobile grammar used by the OTP login flow.
pub fn is_mobile(s: &str) -> bool {
    MOBILE_RE.is_match(s.trim())
}

pub fn is_email(s: &str) -> bool {
    EMAIL_RE.is_match(s.trim())
}

/// 15-character GSTIN with the fixed `Z` in the 14th position.
pub fn is_gstin(s: &str) -> bool {
    GSTIN_RE.is_match(s.trim())
}

/// FSSAI license numbers are exactly 14 digits.
pub fn is_fssai(s: &str) -> bool {
    FSSAI_RE.is_match(s.trim())
}

pub fn is_otp_code(s: &str) -> bool {
    OTP_RE.is_match(s.trim())
}

pub fn generate_otp() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let otp: u32 = rng.gen_range(100000..999999);
    otp.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_must_be_ten_digits() {
        assert!(is_phone10("9876543210"));
        assert!(is_phone10(" 0123456789 "));
        assert!(!is_phone10("987654321"));
        assert!(!is_phone10("98765432101"));
        assert!(!is_phone10("98765x3210"));
    }

    #[test]
    fn mobile_requires_leading_six_to_nine() {
        assert!(is_mobile("9876543210"));
        assert!(is_mobile("6000000000"));
        assert!(!is_mobile("5876543210"));
        assert!(!is_mobile("987654321"));
    }

    #[test]
    fn email_grammar() {
        assert!(is_email("owner@example.com"));
        assert!(is_email("a.b+c@food.co.in"));
        assert!(!is_email("not-an-email"));
        assert!(!is_email("a b@example.com"));
        assert!(!is_email("a@b"));
    }

    #[test]
    fn gstin_accepts_valid_and_rejects_wrong_fixed_char() {
        assert!(is_gstin("29ABCDE1234F1Z5"));
        assert!(is_gstin("29abcde1234f1z5"));
        assert!(!is_gstin("29ABCDE1234F1Y5"));
        assert!(!is_gstin("29ABCDE1234F1Z"));
        assert!(!is_gstin("2XABCDE1234F1Z5"));
    }

    #[test]
    fn fssai_is_fourteen_digits() {
        assert!(is_fssai("12345678901234"));
        assert!(!is_fssai("1234567890123"));
        assert!(!is_fssai("123456789012345"));
        assert!(!is_fssai("1234567890123x"));
    }

    #[test]
    fn otp_codes_are_six_digits() {
        assert!(is_otp_code("123456"));
        assert!(!is_otp_code("12345"));
        let code = generate_otp();
        assert!(is_otp_code(&code));
    }
}
