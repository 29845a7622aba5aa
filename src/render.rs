//! Tera environment construction and the custom template filters.

use anyhow::{Context as _, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tera::{Tera, Value};

use crate::model::format_cents;

static PAYMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Pago:\s*\$(\d+\.?\d*)").expect("payment regex valid"));
static CHANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Cambio:\s*\$(\d+\.?\d*)").expect("change regex valid"));

pub fn build_tera(glob: &str) -> Result<Tera> {
    let mut tera = Tera::new(glob).with_context(|| format!("failed to load templates from {glob}"))?;
    tera.register_filter("money", money_filter);
    tera.register_filter("extract_payment", extract_payment_filter);
    tera.register_filter("extract_change", extract_change_filter);
    Ok(tera)
}

/// `{{ price_cents | money }}` renders integer cents as `N.NN`.
fn money_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let cents = value
        .as_i64()
        .ok_or_else(|| tera::Error::msg("money filter expects an integer cent amount"))?;
    Ok(Value::String(format_cents(cents)))
}

/// Pull the tendered amount out of an order's notes (`Pago: $100.00`).
fn extract_payment_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(extract_amount(&PAYMENT_RE, value)))
}

/// Pull the change out of an order's notes (`Cambio: $5.00`).
fn extract_change_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(extract_amount(&CHANGE_RE, value)))
}

fn extract_amount(re: &Regex, value: &Value) -> String {
    value
        .as_str()
        .and_then(|notes| re.captures(notes))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "0.00".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> HashMap<String, Value> {
        HashMap::new()
    }

    #[test]
    fn money_filter_formats_cents() {
        let out = money_filter(&Value::from(2550_i64), &no_args()).unwrap();
        assert_eq!(out, Value::String("25.50".to_string()));
    }

    #[test]
    fn money_filter_rejects_strings() {
        assert!(money_filter(&Value::String("25.50".into()), &no_args()).is_err());
    }

    #[test]
    fn payment_and_change_are_extracted_from_notes() {
        let notes = Value::String("Pago: $100.00 | Cambio: $12.50".to_string());
        assert_eq!(
            extract_payment_filter(&notes, &no_args()).unwrap(),
            Value::String("100.00".to_string())
        );
        assert_eq!(
            extract_change_filter(&notes, &no_args()).unwrap(),
            Value::String("12.50".to_string())
        );
    }

    #[test]
    fn missing_notes_fall_back_to_zero() {
        assert_eq!(
            extract_payment_filter(&Value::Null, &no_args()).unwrap(),
            Value::String("0.00".to_string())
        );
        let plain = Value::String("sin datos de pago".to_string());
        assert_eq!(
            extract_change_filter(&plain, &no_args()).unwrap(),
            Value::String("0.00".to_string())
        );
    }
}
