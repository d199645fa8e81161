//! Validation gate for freshly parsed orders.
//!
//! Checks run in a fixed order and stop at the first violation. Each
//! violation is reported as [`OrderlyError::InvalidEntity`] carrying the
//! dotted path of the offending field.

use crate::{Order, OrderlyError, OrderlyResult};
use validator::ValidationError;

/// Runs every consistency check against `order`.
///
/// # Errors
///
/// Returns `InvalidEntity` for the first failing check.
pub fn validate_order(order: &Order) -> OrderlyResult<()> {
    check("order.uid", rules::not_empty(&order.uid))?;
    check("order.delivery.phone", rules::valid_phone(&order.delivery.phone))?;
    check("order.delivery.email", rules::valid_email(&order.delivery.email))?;

    for (index, item) in order.items.iter().enumerate() {
        let expected = item.discounted_price();
        if i64::from(item.total_price) != expected {
            return Err(OrderlyError::invalid_entity(
                format!("order.items[{index}].total_price"),
                format!("expected {expected}, got {}", item.total_price),
            ));
        }
    }

    let items_total = order.items_total();
    if u64::from(order.payment.goods_total) != items_total {
        return Err(OrderlyError::invalid_entity(
            "order.payment.goods_total",
            format!(
                "expected sum of item totals {items_total}, got {}",
                order.payment.goods_total
            ),
        ));
    }

    let expected_amount =
        u64::from(order.payment.delivery_cost) + u64::from(order.payment.goods_total);
    if u64::from(order.payment.amount) != expected_amount {
        return Err(OrderlyError::invalid_entity(
            "order.payment.amount",
            format!(
                "expected delivery_cost + goods_total = {expected_amount}, got {}",
                order.payment.amount
            ),
        ));
    }

    Ok(())
}

fn check(field: &str, result: Result<(), ValidationError>) -> OrderlyResult<()> {
    result.map_err(|e| {
        let message = e
            .message
            .as_ref()
            .map_or_else(|| e.code.to_string(), ToString::to_string);
        OrderlyError::invalid_entity(field, message)
    })
}

/// Field-level rules used by the gate.
pub mod rules {
    use validator::{ValidateEmail, ValidationError};

    const MIN_PHONE_DIGITS: usize = 7;
    const MAX_PHONE_DIGITS: usize = 15;

    /// Validates that a string is not empty.
    pub fn not_empty(value: &str) -> Result<(), ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::new("not_empty"));
        }
        Ok(())
    }

    /// Validates a phone number: optional leading `+`, then 7 to 15 digits
    /// including the country code.
    pub fn valid_phone(phone: &str) -> Result<(), ValidationError> {
        let digits = phone.strip_prefix('+').unwrap_or(phone);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::new("phone_invalid_characters"));
        }
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
            return Err(ValidationError::new("phone_invalid_length"));
        }
        Ok(())
    }

    /// Validates an email address of the form `local@domain.tld`.
    pub fn valid_email(email: &str) -> Result<(), ValidationError> {
        if email.matches('@').count() != 1 || !email.validate_email() {
            return Err(ValidationError::new("email_malformed"));
        }
        let domain = email.rsplit('@').next().unwrap_or_default();
        if !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
            || domain.contains("..")
        {
            return Err(ValidationError::new("email_domain_invalid"));
        }
        Ok(())
    }
}
