//! Request-body checks that run before anything touches the store.
//!
//! Both entry points take the decoded JSON object and return typed, normalized
//! fields: names trimmed, prices as `f64`, stock as `i64`.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{NewProduct, ProductChanges};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Validation Error: Missing required fields (name, price, stock).")]
    MissingField,
    #[error("Validation Error: Name must be a string of 2 to 100 characters.")]
    InvalidName,
    #[error("Validation Error: Price must be a non-negative number.")]
    InvalidPrice,
    #[error("Validation Error: Stock must be a non-negative integer.")]
    InvalidStock,
    #[error("Validation Error: At least one field (name, price, or stock) must be provided for update.")]
    NoFieldsProvided,
}

pub fn validate_create(input: &Map<String, Value>) -> Result<NewProduct, ValidationError> {
    let name = input.get("name").filter(|v| !is_blank_name(v));
    let (Some(name), Some(price), Some(stock)) = (name, input.get("price"), input.get("stock"))
    else {
        return Err(ValidationError::MissingField);
    };

    Ok(NewProduct {
        name: parse_name(name)?,
        price: parse_price(price)?,
        stock: parse_stock(stock)?,
    })
}

pub fn validate_update(input: &Map<String, Value>) -> Result<ProductChanges, ValidationError> {
    let changes = ProductChanges {
        name: input.get("name").map(parse_name).transpose()?,
        price: input.get("price").map(parse_price).transpose()?,
        stock: input.get("stock").map(parse_stock).transpose()?,
    };

    if changes.is_empty() {
        return Err(ValidationError::NoFieldsProvided);
    }
    Ok(changes)
}

// `null` and "" are treated as an absent name on create.
fn is_blank_name(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn parse_name(value: &Value) -> Result<String, ValidationError> {
    let trimmed = value.as_str().ok_or(ValidationError::InvalidName)?.trim();
    let chars = trimmed.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(ValidationError::InvalidName);
    }
    Ok(trimmed.to_string())
}

fn parse_price(value: &Value) -> Result<f64, ValidationError> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or(ValidationError::InvalidPrice)?;

    // Rejects NaN and the infinities that `str::parse` happily accepts.
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::InvalidPrice);
    }
    Ok(price)
}

fn parse_stock(value: &Value) -> Result<i64, ValidationError> {
    let Value::Number(n) = value else {
        return Err(ValidationError::InvalidStock);
    };

    let stock = if let Some(i) = n.as_i64() {
        i
    } else {
        match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => return Err(ValidationError::InvalidStock),
        }
    };

    if stock < 0 {
        return Err(ValidationError::InvalidStock);
    }
    Ok(stock)
}
