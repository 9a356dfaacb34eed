//! Phone number and OTP input validation
//!
//! Numbers are normalized to E.164 for the Indian numbering plan before they
//! reach the auth provider. Normalization never fails, it degrades; validity
//! is a separate boolean check so forms can gate submission up front.

const COUNTRY_CODE: &str = "91";
const NATIONAL_LENGTH: usize = 10;
const OTP_LENGTH: usize = 6;

/// Normalize arbitrary phone input to international format.
///
/// Strips every non-digit character, then prefixes the country code for bare
/// ten-digit national numbers. Input that fits neither shape is returned with
/// just a leading `+` and left for the provider to reject.
pub fn normalize_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.starts_with(COUNTRY_CODE) && digits.len() == COUNTRY_CODE.len() + NATIONAL_LENGTH {
        return format!("+{}", digits);
    }

    if digits.len() == NATIONAL_LENGTH {
        return format!("+{}{}", COUNTRY_CODE, digits);
    }

    format!("+{}", digits)
}

/// Check that input normalizes to a valid Indian mobile number
/// (`+91`, then a leading digit 6-9, then nine more digits).
pub fn is_valid_phone_number(raw: &str) -> bool {
    let normalized = normalize_phone_number(raw);
    let national = match normalized.strip_prefix("+91") {
        Some(rest) => rest,
        None => return false,
    };

    national.len() == NATIONAL_LENGTH
        && matches!(national.chars().next(), Some('6'..='9'))
        && national.chars().all(|c| c.is_ascii_digit())
}

/// OTP codes are exactly six ASCII digits, no separators
pub fn is_valid_otp(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ten_digit_number() {
        assert_eq!(normalize_phone_number("9876543210"), "+919876543210");
    }

    #[test]
    fn test_normalize_with_country_prefix() {
        assert_eq!(normalize_phone_number("919876543210"), "+919876543210");
        assert_eq!(normalize_phone_number("+919876543210"), "+919876543210");
    }

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize_phone_number("98765-43210"), "+919876543210");
        assert_eq!(normalize_phone_number("9876 543 210"), "+919876543210");
        assert_eq!(normalize_phone_number("(987) 654-3210"), "+919876543210");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["9876543210", "919876543210", "+919876543210", "12345"] {
            let once = normalize_phone_number(input);
            assert_eq!(normalize_phone_number(&once), once);
        }
    }

    #[test]
    fn test_normalize_passes_through_unclassifiable_input() {
        assert_eq!(normalize_phone_number("12345"), "+12345");
        assert_eq!(normalize_phone_number(""), "+");
    }

    #[test]
    fn test_valid_phone_numbers() {
        assert!(is_valid_phone_number("9876543210"));
        assert!(is_valid_phone_number("+919876543210"));
        assert!(is_valid_phone_number("919876543210"));
        assert!(is_valid_phone_number("98765-43210"));
        assert!(is_valid_phone_number("6000000000"));
    }

    #[test]
    fn test_invalid_phone_numbers() {
        assert!(!is_valid_phone_number("123456789")); // Too short
        assert!(!is_valid_phone_number("1234567890")); // Leading digit not 6-9
        assert!(!is_valid_phone_number("98765432101")); // Too long
        assert!(!is_valid_phone_number("abcdefghij")); // Non-numeric
        assert!(!is_valid_phone_number(""));
    }

    #[test]
    fn test_valid_otp() {
        assert!(is_valid_otp("123456"));
        assert!(is_valid_otp("000000"));
        assert!(is_valid_otp("999999"));
    }

    #[test]
    fn test_invalid_otp() {
        assert!(!is_valid_otp("12345")); // Too short
        assert!(!is_valid_otp("1234567")); // Too long
        assert!(!is_valid_otp("12345a")); // Contains letter
        assert!(!is_valid_otp("12 34 56")); // Contains spaces
        assert!(!is_valid_otp(""));
    }
}
