// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Exact integer normalization for amounts and gas fields
//!
//! Values reach the submitter as JSON numbers, decimal or hex strings, or
//! already-exact integers. All of them collapse to one [`U256`] here, and any
//! input that cannot be represented without loss is rejected.

use alloy_primitives::U256;
use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// Largest integer an IEEE-754 double represents exactly (2^53 - 1).
const MAX_SAFE_FLOAT_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A numeric value in any of the encodings bridge tooling emits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericValue {
    #[serde(skip)]
    Exact(U256),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

impl NumericValue {
    /// Returns the canonical exact integer.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidAmount`] for negative, fractional, non-finite,
    /// imprecise or unparseable inputs.
    pub fn to_u256(&self) -> Result<U256> {
        match self {
            NumericValue::Exact(value) => Ok(*value),
            NumericValue::Unsigned(value) => Ok(U256::from(*value)),
            NumericValue::Signed(value) => u64::try_from(*value)
                .map(U256::from)
                .map_err(|_| BridgeError::invalid_amount(value, "negative values are not allowed")),
            NumericValue::Float(value) => float_to_u256(*value),
            NumericValue::Text(text) => text_to_u256(text),
        }
    }
}

/// Normalizes any supported encoding into an exact integer.
pub fn normalize(value: impl Into<NumericValue>) -> Result<U256> {
    value.into().to_u256()
}

fn float_to_u256(value: f64) -> Result<U256> {
    if !value.is_finite() {
        return Err(BridgeError::invalid_amount(value, "not a finite number"));
    }
    if value < 0.0 {
        return Err(BridgeError::invalid_amount(value, "negative values are not allowed"));
    }
    if value.fract() != 0.0 {
        return Err(BridgeError::invalid_amount(value, "not an integer"));
    }
    if value > MAX_SAFE_FLOAT_INTEGER {
        return Err(BridgeError::invalid_amount(
            value,
            "exceeds 2^53 - 1 and cannot be represented exactly; pass it as a string",
        ));
    }
    Ok(U256::from(value as u64))
}

fn text_to_u256(text: &str) -> Result<U256> {
    let trimmed = text.trim();

    let (digits, radix) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (trimmed, 10),
    };

    if digits.is_empty() {
        return Err(BridgeError::invalid_amount(text, "empty numeric string"));
    }
    let valid = match radix {
        16 => digits.chars().all(|c| c.is_ascii_hexdigit()),
        _ => digits.chars().all(|c| c.is_ascii_digit()),
    };
    if !valid {
        return Err(BridgeError::invalid_amount(
            text,
            "expected an unsigned decimal or 0x-prefixed hex integer",
        ));
    }

    U256::from_str_radix(digits, radix)
        .map_err(|e| BridgeError::invalid_amount(text, e.to_string()))
}

/// Converts a human-readable decimal amount into base units.
///
/// `parse_units("1.5", 6)` is `1_500_000`. More fractional digits than
/// `decimals` is an error rather than a silent truncation.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let trimmed = amount.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(BridgeError::invalid_amount(amount, "empty amount"));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(BridgeError::invalid_amount(
            amount,
            "expected an unsigned decimal number",
        ));
    }
    if fraction.len() > decimals as usize {
        return Err(BridgeError::invalid_amount(
            amount,
            format!("more than {decimals} fractional digits"),
        ));
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(decimals as usize - fraction.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|e| BridgeError::invalid_amount(amount, e.to_string()))
}

/// Renders base units as a decimal string, trimming trailing zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

impl From<U256> for NumericValue {
    fn from(value: U256) -> Self {
        NumericValue::Exact(value)
    }
}

impl From<u128> for NumericValue {
    fn from(value: u128) -> Self {
        NumericValue::Exact(U256::from(value))
    }
}

impl From<u64> for NumericValue {
    fn from(value: u64) -> Self {
        NumericValue::Unsigned(value)
    }
}

impl From<u32> for NumericValue {
    fn from(value: u32) -> Self {
        NumericValue::Unsigned(value as u64)
    }
}

impl From<i64> for NumericValue {
    fn from(value: i64) -> Self {
        NumericValue::Signed(value)
    }
}

impl From<f64> for NumericValue {
    fn from(value: f64) -> Self {
        NumericValue::Float(value)
    }
}

impl From<&str> for NumericValue {
    fn from(value: &str) -> Self {
        NumericValue::Text(value.to_string())
    }
}

impl From<String> for NumericValue {
    fn from(value: String) -> Self {
        NumericValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NumericValue::from("250000"))]
    #[case(NumericValue::from(" 250000 "))]
    #[case(NumericValue::from("0x3d090"))]
    #[case(NumericValue::from(250_000u64))]
    #[case(NumericValue::from(250_000i64))]
    #[case(NumericValue::from(250_000.0f64))]
    #[case(NumericValue::from(U256::from(250_000u64)))]
    fn test_encodings_agree(#[case] value: NumericValue) {
        assert_eq!(value.to_u256().unwrap(), U256::from(250_000u64));
    }

    #[test]
    fn test_large_decimal_string_is_exact() {
        let wei = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(normalize(wei).unwrap(), U256::MAX);
    }

    #[rstest]
    #[case(NumericValue::from("-1"))]
    #[case(NumericValue::from("1.5"))]
    #[case(NumericValue::from("1e18"))]
    #[case(NumericValue::from(""))]
    #[case(NumericValue::from("0x"))]
    #[case(NumericValue::from("0xzz"))]
    #[case(NumericValue::from(-5i64))]
    #[case(NumericValue::from(0.5f64))]
    #[case(NumericValue::from(f64::NAN))]
    #[case(NumericValue::from(1e20f64))]
    fn test_lossy_inputs_rejected(#[case] value: NumericValue) {
        assert!(matches!(
            value.to_u256(),
            Err(BridgeError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_overflowing_text_rejected() {
        let too_big = format!("1{}", "0".repeat(80));
        assert!(normalize(too_big.as_str()).is_err());
    }

    #[test]
    fn test_json_numbers_deserialize() {
        let values: Vec<NumericValue> =
            serde_json::from_str(r#"[21000, -1, 1.5, "0x10"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                NumericValue::Unsigned(21000),
                NumericValue::Signed(-1),
                NumericValue::Float(1.5),
                NumericValue::Text("0x10".to_string()),
            ]
        );
    }

    #[rstest]
    #[case("100", 6, 100_000_000u64)]
    #[case("1.5", 6, 1_500_000u64)]
    #[case("0.000001", 6, 1u64)]
    #[case(".25", 2, 25u64)]
    #[case("7.", 0, 7u64)]
    #[case("0", 9, 0u64)]
    fn test_parse_units(#[case] amount: &str, #[case] decimals: u8, #[case] expected: u64) {
        assert_eq!(parse_units(amount, decimals).unwrap(), U256::from(expected));
    }

    #[rstest]
    #[case("1.0000001", 6)]
    #[case("1,5", 6)]
    #[case("-1", 6)]
    #[case(".", 6)]
    fn test_parse_units_rejects(#[case] amount: &str, #[case] decimals: u8) {
        assert!(matches!(
            parse_units(amount, decimals),
            Err(BridgeError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::from(100_000_000u64), 6), "100");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }
}
