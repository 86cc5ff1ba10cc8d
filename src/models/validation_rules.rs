use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use validator::ValidationError;

use types::ProductPrice;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError {
        code: Cow::from(code),
        message: Some(Cow::from(message)),
        params: HashMap::new(),
    }
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref PHONE_VALIDATION_RE: Regex = Regex::new(r"^\+?\d{7}\d*$").unwrap();
    }

    if PHONE_VALIDATION_RE.is_match(phone) {
        Ok(())
    } else {
        Err(error("phone", "Incorrect phone format"))
    }
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref SLUG_VALIDATION_RE: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    }

    if SLUG_VALIDATION_RE.is_match(slug) {
        Ok(())
    } else {
        Err(error("slug", "Slug may contain lowercase latin letters, digits and single dashes"))
    }
}

/// Taxpayer number of an organization: 10 digits for companies, 12 for entrepreneurs
pub fn validate_inn(inn: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref INN_VALIDATION_RE: Regex = Regex::new(r"^(\d{10}|\d{12})$").unwrap();
    }

    if INN_VALIDATION_RE.is_match(inn) {
        Ok(())
    } else {
        Err(error("inn", "INN must contain 10 or 12 digits"))
    }
}

pub fn validate_positive_quantity(quantity: i32) -> Result<(), ValidationError> {
    if quantity > 0 {
        Ok(())
    } else {
        Err(error("quantity", "Quantity must be positive"))
    }
}

pub fn validate_positive_price(price: &ProductPrice) -> Result<(), ValidationError> {
    if price.0 > 0f64 && price.0.is_finite() {
        Ok(())
    } else {
        Err(error("price", "Price must be positive"))
    }
}

pub fn validate_delivery_days(days: i32) -> Result<(), ValidationError> {
    if days >= 0 && days <= 365 {
        Ok(())
    } else {
        Err(error("delivery_days", "Delivery days must be between 0 and 365"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ProductPrice;

    #[test]
    fn slugs() {
        assert!(validate_slug("toyota").is_ok());
        assert!(validate_slug("land-cruiser-200").is_ok());
        assert!(validate_slug("Toyota").is_err());
        assert!(validate_slug("land--cruiser").is_err());
        assert!(validate_slug("-lada").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn inns() {
        assert!(validate_inn("7707083893").is_ok());
        assert!(validate_inn("500100732259").is_ok());
        assert!(validate_inn("77070838").is_err());
        assert!(validate_inn("77070838931").is_err());
        assert!(validate_inn("77070838ab").is_err());
    }

    #[test]
    fn phones() {
        assert!(validate_phone("+79161234567").is_ok());
        assert!(validate_phone("12-34").is_err());
    }

    #[test]
    fn numbers() {
        assert!(validate_positive_quantity(1).is_ok());
        assert!(validate_positive_quantity(0).is_err());
        assert!(validate_positive_price(&ProductPrice(10.5)).is_ok());
        assert!(validate_positive_price(&ProductPrice(0.0)).is_err());
        assert!(validate_delivery_days(0).is_ok());
        assert!(validate_delivery_days(-1).is_err());
    }
}
