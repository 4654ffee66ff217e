//! Account validation tests
//!
//! - Sign-up requires matching passwords of reasonable strength
//! - Usernames are restricted to a safe character set
//! - Phone numbers are checked on their digits only

use proptest::prelude::*;
use shared::{
    check_username, phone_digits, validate_password, validate_phone, LoginInput, RegisterInput,
};
use validator::Validate;

fn register(username: &str, password: &str, confirmation: &str) -> RegisterInput {
    RegisterInput {
        username: username.to_string(),
        email: None,
        full_name: None,
        phone: None,
        password: password.to_string(),
        password_confirmation: confirmation.to_string(),
    }
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn username_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9._@+-]{2,30}"
}

/// Passwords with at least one letter so they are never all digits
fn password_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9!@#$%]{7,40}"
}

fn phone_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{10,13}",
        "\\([0-9]{2}\\) [0-9]{5}-[0-9]{4}",
        "\\+55 [0-9]{2} [0-9]{4}-[0-9]{4}",
    ]
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_valid_registration() {
        let mut input = register("maria.s", "coffee-and-cake1", "coffee-and-cake1");
        input.email = Some("maria@example.com".to_string());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        let mut input = register("maria", "secret123", "secret123");
        input.email = Some("not-an-email".to_string());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_numeric_password_rejected() {
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("1234567a").is_ok());
        assert!(validate_password("abc").is_err());
    }

    #[test]
    fn test_username_characters() {
        assert!(check_username("ana+shop@mail.com").is_ok());
        assert!(check_username("").is_err());
        assert!(check_username("ana silva").is_err());
        assert!(check_username("ana/silva").is_err());
    }

    #[test]
    fn test_phone_formatting_is_ignored() {
        assert_eq!(phone_digits("(11) 98765-4321"), "11987654321");
        assert!(validate_phone("(11) 98765-4321").is_ok());
        assert!(validate_phone("98765-4321").is_err());
        assert!(validate_phone("+55 11 98765-4321 99").is_err());
    }

    #[test]
    fn test_login_requires_both_fields() {
        let empty = LoginInput {
            username: String::new(),
            password: "secret123".to_string(),
        };
        assert!(empty.validate().is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Registration succeeds exactly when the confirmation matches
        #[test]
        fn prop_confirmation_must_match(
            username in username_strategy(),
            password in password_strategy(),
            other in password_strategy(),
        ) {
            prop_assert!(register(&username, &password, &password).validate().is_ok());
            if other != password {
                prop_assert!(register(&username, &password, &other).validate().is_err());
            }
        }

        /// Allowed username characters always pass the username check
        #[test]
        fn prop_generated_usernames_valid(username in username_strategy()) {
            prop_assert!(check_username(&username).is_ok());
        }

        /// Whitespace anywhere in a username is rejected
        #[test]
        fn prop_usernames_with_spaces_rejected(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
            let username = format!("{} {}", a, b);
            prop_assert!(check_username(&username).is_err());
        }

        /// Formatted phone numbers validate on their 10 to 13 digits
        #[test]
        fn prop_phone_digits_in_range(phone in phone_strategy()) {
            let digits = phone_digits(&phone);
            prop_assert!((10..=13).contains(&digits.len()));
            prop_assert!(validate_phone(&phone).is_ok());
        }
    }
}
