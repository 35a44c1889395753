//! Transformation parameter values and their canonical string forms.

use std::fmt::Write as _;

use crate::error::{CloudinaryError, Result};
use crate::transformation::expression::Expression;
use crate::transformation::layer::LayerSpec;

/// A single transformation value. Each variant has exactly one normalization rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Rendered with a trailing `%`.
    Percent(f64),
    /// Number with a unit suffix, e.g. `44k` or `2.3s`.
    Suffixed(f64, &'static str),
    /// `numerator:denominator`
    Ratio(f64, f64),
    /// `min-max`, either side may be open.
    Range(Option<f64>, Option<f64>),
    /// Multi-valued keys, joined with `.` in the order supplied.
    Sequence(Vec<ParamValue>),
    /// Components of one logical value, joined with `:`.
    Compound(Vec<ParamValue>),
    Layer(LayerSpec),
    /// Arithmetic over asset properties and variables, e.g. `ih_mul_2`.
    Expression(Expression),
}

impl ParamValue {
    pub fn percent(value: impl Into<f64>) -> Self {
        ParamValue::Percent(value.into())
    }

    pub fn ratio(numerator: impl Into<f64>, denominator: impl Into<f64>) -> Self {
        ParamValue::Ratio(numerator.into(), denominator.into())
    }

    pub fn sequence<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        ParamValue::Sequence(values.into_iter().map(Into::into).collect())
    }

    /// Canonical token for this value, `None` when the value is empty and the
    /// key should be omitted.
    pub fn normalize(&self) -> Result<Option<String>> {
        match self {
            ParamValue::Int(n) => Ok(Some(n.to_string())),
            ParamValue::Float(f) => format_float(*f).map(Some),
            ParamValue::Text(s) => Ok(non_empty(s.clone())),
            ParamValue::Percent(f) => Ok(Some(format!("{}%", format_float(*f)?))),
            ParamValue::Suffixed(f, unit) => Ok(Some(format!("{}{}", format_float(*f)?, unit))),
            ParamValue::Ratio(n, d) => normalize_ratio(*n, *d).map(Some),
            ParamValue::Range(min, max) => normalize_range(*min, *max),
            ParamValue::Sequence(items) => join_normalized(items, "."),
            ParamValue::Compound(parts) => join_normalized(parts, ":"),
            ParamValue::Layer(layer) => layer.render().map(Some),
            ParamValue::Expression(expression) => expression.render(),
        }
    }
}

/// Shortest decimal form with no trailing zeros (`1.0` -> `1`, `0.50` -> `0.5`).
pub fn format_float(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(CloudinaryError::invalid(format!(
            "Transformation value must be a finite number, got {}",
            value
        )));
    }
    if value == 0.0 {
        return Ok("0".to_string());
    }
    Ok(value.to_string())
}

fn normalize_ratio(numerator: f64, denominator: f64) -> Result<String> {
    if denominator == 0.0 {
        return Err(CloudinaryError::invalid("Ratio denominator must not be zero"));
    }
    Ok(format!("{}:{}", format_float(numerator)?, format_float(denominator)?))
}

fn normalize_range(min: Option<f64>, max: Option<f64>) -> Result<Option<String>> {
    let mut out = String::new();
    match (min, max) {
        (None, None) => return Ok(None),
        (Some(min), None) => {
            let _ = write!(out, "{}-", format_float(min)?);
        }
        (None, Some(max)) => {
            let _ = write!(out, "-{}", format_float(max)?);
        }
        (Some(min), Some(max)) => {
            if min > max {
                return Err(CloudinaryError::invalid(format!(
                    "Range minimum {} is greater than maximum {}",
                    min, max
                )));
            }
            let _ = write!(out, "{}-{}", format_float(min)?, format_float(max)?);
        }
    }
    Ok(Some(out))
}

fn join_normalized(items: &[ParamValue], delimiter: &str) -> Result<Option<String>> {
    let mut tokens = Vec::with_capacity(items.len());
    for item in items {
        if let Some(token) = item.normalize()? {
            tokens.push(token);
        }
    }
    if tokens.is_empty() {
        Ok(None)
    } else {
        Ok(Some(tokens.join(delimiter)))
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// `#rrggbb` becomes `rgb:rrggbb`; named colors pass through.
pub(crate) fn normalize_color(color: &str) -> String {
    match color.strip_prefix('#') {
        Some(hex) => format!("rgb:{}", hex),
        None => color.to_string(),
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        // Through the decimal string, so 0.1f32 stays 0.1 rather than 0.10000000149011612
        ParamValue::Float(v.to_string().parse().unwrap_or(v as f64))
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<LayerSpec> for ParamValue {
    fn from(v: LayerSpec) -> Self {
        ParamValue::Layer(v)
    }
}

impl From<Expression> for ParamValue {
    fn from(v: Expression) -> Self {
        ParamValue::Expression(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_and_text() {
        assert_eq!(ParamValue::from(100).normalize().unwrap().as_deref(), Some("100"));
        assert_eq!(ParamValue::from("fill").normalize().unwrap().as_deref(), Some("fill"));
        assert_eq!(ParamValue::from("").normalize().unwrap(), None);
    }

    #[test]
    fn test_float_has_no_trailing_zeros() {
        assert_eq!(format_float(1.0).unwrap(), "1");
        assert_eq!(format_float(0.5).unwrap(), "0.5");
        assert_eq!(format_float(1.1).unwrap(), "1.1");
        assert_eq!(format_float(-0.0).unwrap(), "0");
        assert_eq!(format_float(0.333).unwrap(), "0.333");
        assert_eq!(ParamValue::from(0.1f32).normalize().unwrap().as_deref(), Some("0.1"));
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(format_float(f64::NAN).is_err());
        assert!(ParamValue::Float(f64::INFINITY).normalize().is_err());
    }

    #[test]
    fn test_percent_and_suffixed() {
        assert_eq!(ParamValue::percent(30).normalize().unwrap().as_deref(), Some("30%"));
        assert_eq!(ParamValue::percent(12.5).normalize().unwrap().as_deref(), Some("12.5%"));
        assert_eq!(ParamValue::Suffixed(44.0, "k").normalize().unwrap().as_deref(), Some("44k"));
        assert_eq!(ParamValue::Suffixed(2.3, "s").normalize().unwrap().as_deref(), Some("2.3s"));
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ParamValue::ratio(16, 9).normalize().unwrap().as_deref(), Some("16:9"));
        assert!(ParamValue::ratio(16, 0).normalize().is_err());
    }

    #[test]
    fn test_range() {
        assert_eq!(
            ParamValue::Range(Some(24.0), Some(29.97)).normalize().unwrap().as_deref(),
            Some("24-29.97")
        );
        assert_eq!(ParamValue::Range(Some(25.0), None).normalize().unwrap().as_deref(), Some("25-"));
        assert_eq!(ParamValue::Range(None, None).normalize().unwrap(), None);
        assert!(ParamValue::Range(Some(30.0), Some(10.0)).normalize().is_err());
    }

    #[test]
    fn test_sequence_keeps_order_and_skips_empty() {
        let value = ParamValue::sequence(["trim", "", "auto"]);
        assert_eq!(value.normalize().unwrap().as_deref(), Some("trim.auto"));
        let value = ParamValue::sequence([90, 10]);
        assert_eq!(value.normalize().unwrap().as_deref(), Some("90.10"));
        assert_eq!(ParamValue::sequence(Vec::<&str>::new()).normalize().unwrap(), None);
    }

    #[test]
    fn test_compound() {
        let value = ParamValue::Compound(vec!["h264".into(), "baseline".into(), "3.1".into()]);
        assert_eq!(value.normalize().unwrap().as_deref(), Some("h264:baseline:3.1"));
        let value = ParamValue::Compound(vec!["sepia".into(), "".into()]);
        assert_eq!(value.normalize().unwrap().as_deref(), Some("sepia"));
    }

    #[test]
    fn test_expression_value() {
        let value = ParamValue::from(Expression::new("initialHeight * 2"));
        assert_eq!(value.normalize().unwrap().as_deref(), Some("ih_mul_2"));
        assert_eq!(ParamValue::from(Expression::new("")).normalize().unwrap(), None);
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#ff0000"), "rgb:ff0000");
        assert_eq!(normalize_color("red"), "red");
    }
}
