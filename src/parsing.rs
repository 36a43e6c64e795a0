use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{ProbeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealWidth {
    W32,
    W64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Integer,
    Decimal,
}

/// Numeric representation a metric value arrives in.
///
/// Threshold operands are always parsed in the family of the value they are
/// compared against, so `"3000000000"` is a valid bound for a 64-bit counter
/// and a format error for a 32-bit one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericFamily {
    Integral(IntWidth),
    Real(RealWidth),
    ArbitraryPrecision(Precision),
}

impl fmt::Display for NumericFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericFamily::Integral(IntWidth::W8) => f.write_str("integer (8-bit)"),
            NumericFamily::Integral(IntWidth::W16) => f.write_str("integer (16-bit)"),
            NumericFamily::Integral(IntWidth::W32) => f.write_str("integer (32-bit)"),
            NumericFamily::Integral(IntWidth::W64) => f.write_str("integer (64-bit)"),
            NumericFamily::Real(RealWidth::W32) => f.write_str("real (32-bit)"),
            NumericFamily::Real(RealWidth::W64) => f.write_str("real (64-bit)"),
            NumericFamily::ArbitraryPrecision(Precision::Integer) => {
                f.write_str("arbitrary-precision integer")
            }
            NumericFamily::ArbitraryPrecision(Precision::Decimal) => {
                f.write_str("arbitrary-precision decimal")
            }
        }
    }
}

impl NumericFamily {
    /// Parse `text` as a number of this family.
    pub fn parse(self, text: &str) -> Result<NumericValue> {
        let parsed = match self {
            NumericFamily::Integral(width) => {
                parse_integral(width, text).map(|value| NumericValue::Integral { value, width })
            }
            NumericFamily::Real(width) => {
                parse_real(width, text).map(|value| NumericValue::Real { value, width })
            }
            NumericFamily::ArbitraryPrecision(Precision::Integer) => {
                BigInt::from_str(text).ok().map(NumericValue::BigInteger)
            }
            NumericFamily::ArbitraryPrecision(Precision::Decimal) => {
                BigDecimal::from_str(text).ok().map(NumericValue::BigDecimal)
            }
        };
        parsed.ok_or_else(|| ProbeError::ThresholdValueFormat {
            value: text.to_string(),
            expected: self,
        })
    }
}

fn parse_integral(width: IntWidth, text: &str) -> Option<i64> {
    match width {
        IntWidth::W8 => text.parse::<i8>().ok().map(i64::from),
        IntWidth::W16 => text.parse::<i16>().ok().map(i64::from),
        IntWidth::W32 => text.parse::<i32>().ok().map(i64::from),
        IntWidth::W64 => text.parse::<i64>().ok(),
    }
}

fn parse_real(width: RealWidth, text: &str) -> Option<f64> {
    match width {
        RealWidth::W32 => text.parse::<f32>().ok().map(f64::from),
        RealWidth::W64 => text.parse::<f64>().ok(),
    }
}

/// A numeric metric value tagged with its family.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    Integral { value: i64, width: IntWidth },
    Real { value: f64, width: RealWidth },
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
}

impl NumericValue {
    pub fn family(&self) -> NumericFamily {
        match self {
            NumericValue::Integral { width, .. } => NumericFamily::Integral(*width),
            NumericValue::Real { width, .. } => NumericFamily::Real(*width),
            NumericValue::BigInteger(_) => NumericFamily::ArbitraryPrecision(Precision::Integer),
            NumericValue::BigDecimal(_) => NumericFamily::ArbitraryPrecision(Precision::Decimal),
        }
    }

    /// Order two values of the same family.
    ///
    /// Returns `None` across families and for NaN.
    pub fn compare(&self, other: &NumericValue) -> Option<Ordering> {
        match (self, other) {
            (NumericValue::Integral { value: a, .. }, NumericValue::Integral { value: b, .. }) => {
                Some(a.cmp(b))
            }
            (NumericValue::Real { value: a, .. }, NumericValue::Real { value: b, .. }) => {
                a.partial_cmp(b)
            }
            (NumericValue::BigInteger(a), NumericValue::BigInteger(b)) => Some(a.cmp(b)),
            (NumericValue::BigDecimal(a), NumericValue::BigDecimal(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Integral { value, .. } => write!(f, "{}", value),
            // widened on the way in; narrow again so 0.1f32 prints as 0.1
            NumericValue::Real { value, width: RealWidth::W32 } => write!(f, "{}", *value as f32),
            NumericValue::Real { value, width: RealWidth::W64 } => write!(f, "{}", value),
            NumericValue::BigInteger(v) => write!(f, "{}", v),
            // positional form, never exponent notation
            NumericValue::BigDecimal(v) => f.write_str(&v.to_plain_string()),
        }
    }
}

impl From<i8> for NumericValue {
    fn from(value: i8) -> Self {
        NumericValue::Integral { value: value.into(), width: IntWidth::W8 }
    }
}

impl From<i16> for NumericValue {
    fn from(value: i16) -> Self {
        NumericValue::Integral { value: value.into(), width: IntWidth::W16 }
    }
}

impl From<i32> for NumericValue {
    fn from(value: i32) -> Self {
        NumericValue::Integral { value: value.into(), width: IntWidth::W32 }
    }
}

impl From<i64> for NumericValue {
    fn from(value: i64) -> Self {
        NumericValue::Integral { value, width: IntWidth::W64 }
    }
}

impl From<f32> for NumericValue {
    fn from(value: f32) -> Self {
        NumericValue::Real { value: value.into(), width: RealWidth::W32 }
    }
}

impl From<f64> for NumericValue {
    fn from(value: f64) -> Self {
        NumericValue::Real { value, width: RealWidth::W64 }
    }
}

impl From<BigInt> for NumericValue {
    fn from(value: BigInt) -> Self {
        NumericValue::BigInteger(value)
    }
}

impl From<BigDecimal> for NumericValue {
    fn from(value: BigDecimal) -> Self {
        NumericValue::BigDecimal(value)
    }
}
