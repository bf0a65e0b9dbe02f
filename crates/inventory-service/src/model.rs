//! Product write models and their validation.

use common::Money;
use serde::Deserialize;

/// Body of `POST /products`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money, quantity: i64) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_price(self.price)?;
        validate_quantity(self.quantity)
    }
}

/// Body of `PATCH /products/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub quantity: Option<i64>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        Ok(())
    }
}

fn validate_price(price: Money) -> Result<(), String> {
    if !price.is_positive() {
        return Err(format!("price must be greater than 0, got {price}"));
    }
    if price.has_sub_cent_digits() {
        return Err(format!("price must be in whole cents, got {price}"));
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> Result<(), String> {
    if quantity >= 0 {
        Ok(())
    } else {
        Err(format!("quantity must be at least 0, got {quantity}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_must_be_positive() {
        assert!(NewProduct::new("Widget", Money::from_cents(1), 0).validate().is_ok());
        assert!(NewProduct::new("Widget", Money::zero(), 1).validate().is_err());
        assert!(NewProduct::new("Widget", Money::from_cents(-100), 1).validate().is_err());
    }

    #[test]
    fn test_price_must_be_whole_cents() {
        let half_cent: NewProduct =
            serde_json::from_str(r#"{"name":"W","price":"0.005","quantity":1}"#).unwrap();
        assert!(half_cent.validate().is_err());

        let padded: NewProduct =
            serde_json::from_str(r#"{"name":"W","price":"0.500","quantity":1}"#).unwrap();
        assert!(padded.validate().is_ok());
    }

    #[test]
    fn test_quantity_must_not_be_negative() {
        assert!(NewProduct::new("Widget", Money::from_cents(100), -1).validate().is_err());
    }

    #[test]
    fn test_partial_update_validation() {
        assert!(ProductUpdate::default().validate().is_ok());
        let update = ProductUpdate {
            price: Some(Money::zero()),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_price_accepts_number_or_string() {
        let a: NewProduct =
            serde_json::from_str(r#"{"name":"W","price":10.5,"quantity":1}"#).unwrap();
        let b: NewProduct =
            serde_json::from_str(r#"{"name":"W","price":"10.50","quantity":1}"#).unwrap();
        assert_eq!(a.price, b.price);
    }
}
