//! Validation utilities for the storefront
//!
//! Plain checks return `&'static str` messages; the `validator` hooks wrap
//! them in `ValidationError` for use in `#[validate(custom = ...)]`.

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::models::CreateFeedbackInput;

// ============================================================================
// Catalog and stock
// ============================================================================

/// Prices and costs are non-negative money amounts
pub fn validate_money(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if amount.scale() > 2 && amount.round_dp(2) != amount {
        return Err("Amount cannot have more than two decimal places");
    }
    Ok(())
}

/// Expense and entry amounts must be strictly positive
pub fn validate_positive_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero");
    }
    validate_money(amount)
}

/// Minimum stock threshold cannot exceed the ideal level
pub fn validate_stock_limits(min_stock: i32, ideal_stock: i32) -> Result<(), &'static str> {
    if min_stock < 0 || ideal_stock < 0 {
        return Err("Stock limits cannot be negative");
    }
    if min_stock > ideal_stock {
        return Err("Minimum stock cannot be greater than ideal stock");
    }
    Ok(())
}

/// Largest quantity a single cart or order line may hold
pub const MAX_LINE_QUANTITY: i32 = 10_000;

/// Largest quantity a product may keep in stock
pub const MAX_STOCK_QUANTITY: i32 = 1_000_000;

/// Cart and order quantities
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err("Quantity exceeds the per-line limit");
    }
    Ok(())
}

// ============================================================================
// Accounts and contact data
// ============================================================================

/// Usernames are letters, digits and `@ . + - _`
pub fn check_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username is required");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err("Username may only contain letters, digits and @.+-_");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password cannot be entirely numeric");
    }
    Ok(())
}

/// Phone numbers are 10 to 13 digits once formatting is stripped
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits = phone_digits(phone);
    if digits.len() < 10 || digits.len() > 13 {
        return Err("Invalid phone number");
    }
    Ok(())
}

/// Digits of a phone number, without spaces, dashes or parentheses
pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

// ============================================================================
// validator hooks
// ============================================================================

fn to_validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    check_username(username).map_err(|m| to_validation_error("username", m))
}

pub fn validate_feedback_target(input: &CreateFeedbackInput) -> Result<(), ValidationError> {
    if input.product_id.is_none() && input.order_id.is_none() {
        return Err(to_validation_error(
            "feedback_target",
            "Feedback must reference a product or an order",
        ));
    }
    Ok(())
}
