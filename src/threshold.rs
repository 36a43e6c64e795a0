use std::fmt;

use crate::error::{ProbeError, Result};
use crate::parsing::{NumericFamily, NumericValue};

/// Nagios-style threshold range.
///
/// Accepted forms:
///
/// | text    | alert when          |
/// |---------|---------------------|
/// | `N`     | `v < 0 or v > N`    |
/// | `N:`    | `v < N`             |
/// | `~:N`   | `v > N`             |
/// | `N:M`   | `v < N or v > M`    |
/// | `@N:M`  | `N <= v <= M`       |
///
/// Operands are non-negative decimals. `ThresholdRange<String>` is the
/// syntactic form; operands are only interpreted once the family of the
/// value under test is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRange<T = NumericValue> {
    min: Option<T>,
    max: Option<T>,
    negate: bool,
}

impl<T> ThresholdRange<T> {
    pub fn min(&self) -> Option<&T> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&T> {
        self.max.as_ref()
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }
}

impl ThresholdRange<String> {
    /// Recognise one of the five range forms without interpreting operands.
    pub fn parse_syntax(text: &str) -> Result<Self> {
        let invalid = || ProbeError::InvalidThresholdSyntax(text.to_string());

        if let Some(rest) = text.strip_prefix('@') {
            return match rest.split_once(':') {
                Some((lo, hi)) if is_operand(lo) && is_operand(hi) => Ok(syntax(Some(lo), Some(hi), true)),
                _ => Err(invalid()),
            };
        }

        if let Some(hi) = text.strip_prefix("~:") {
            return if is_operand(hi) {
                Ok(syntax(None, Some(hi), false))
            } else {
                Err(invalid())
            };
        }

        match text.split_once(':') {
            None if is_operand(text) => Ok(syntax(Some("0"), Some(text), false)),
            Some((lo, "")) if is_operand(lo) => Ok(syntax(Some(lo), None, false)),
            Some((lo, hi)) if is_operand(lo) && is_operand(hi) => Ok(syntax(Some(lo), Some(hi), false)),
            _ => Err(invalid()),
        }
    }

    /// Interpret the operands in `family`.
    pub fn with_family(self, family: NumericFamily) -> Result<ThresholdRange<NumericValue>> {
        Ok(ThresholdRange {
            min: self.min.map(|m| family.parse(&m)).transpose()?,
            max: self.max.map(|m| family.parse(&m)).transpose()?,
            negate: self.negate,
        })
    }
}

impl ThresholdRange<NumericValue> {
    pub fn parse(text: &str, family: NumericFamily) -> Result<Self> {
        ThresholdRange::parse_syntax(text)?.with_family(family)
    }

    /// Whether `value` falls in the alerting region of this range.
    ///
    /// A value that cannot be ordered against the bounds (NaN) never alerts.
    pub fn is_outside(&self, value: &NumericValue) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};

        if self.negate {
            let above_min = self
                .min
                .as_ref()
                .map_or(true, |m| matches!(value.compare(m), Some(Greater | Equal)));
            let below_max = self
                .max
                .as_ref()
                .map_or(true, |m| matches!(value.compare(m), Some(Less | Equal)));
            above_min && below_max
        } else {
            let below = self
                .min
                .as_ref()
                .map_or(false, |m| value.compare(m) == Some(Less));
            let above = self
                .max
                .as_ref()
                .map_or(false, |m| value.compare(m) == Some(Greater));
            below || above
        }
    }
}

impl<T: fmt::Display> fmt::Display for ThresholdRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(lo), Some(hi)) if self.negate => write!(f, "@{}:{}", lo, hi),
            (Some(lo), Some(hi)) => write!(f, "{}:{}", lo, hi),
            (Some(lo), None) => write!(f, "{}:", lo),
            (None, Some(hi)) => write!(f, "~:{}", hi),
            (None, None) => Ok(()),
        }
    }
}

fn syntax(min: Option<&str>, max: Option<&str>, negate: bool) -> ThresholdRange<String> {
    ThresholdRange {
        min: min.map(str::to_string),
        max: max.map(str::to_string),
        negate,
    }
}

// \d+\.?\d*
fn is_operand(s: &str) -> bool {
    let (int, frac) = s.split_once('.').unwrap_or((s, ""));
    !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{IntWidth, Precision, RealWidth};

    const LONG: NumericFamily = NumericFamily::Integral(IntWidth::W64);
    const DOUBLE: NumericFamily = NumericFamily::Real(RealWidth::W64);

    fn long(v: i64) -> NumericValue {
        NumericValue::from(v)
    }

    #[test]
    fn test_plain_upper_bound() {
        let range = ThresholdRange::parse("10", LONG).unwrap();
        assert_eq!(range.min(), Some(&long(0)));
        assert_eq!(range.max(), Some(&long(10)));
        assert!(!range.is_negated());

        assert!(range.is_outside(&long(-1)));
        assert!(!range.is_outside(&long(0)));
        assert!(!range.is_outside(&long(10)));
        assert!(range.is_outside(&long(11)));
    }

    #[test]
    fn test_open_ranges() {
        let lower = ThresholdRange::parse("10:", LONG).unwrap();
        assert!(lower.is_outside(&long(9)));
        assert!(!lower.is_outside(&long(10)));
        assert!(!lower.is_outside(&long(i64::MAX)));

        let upper = ThresholdRange::parse("~:10", LONG).unwrap();
        assert!(!upper.is_outside(&long(i64::MIN)));
        assert!(!upper.is_outside(&long(10)));
        assert!(upper.is_outside(&long(11)));
    }

    #[test]
    fn test_closed_and_inverted_ranges() {
        let closed = ThresholdRange::parse("10:20", LONG).unwrap();
        assert!(closed.is_outside(&long(9)));
        assert!(!closed.is_outside(&long(15)));
        assert!(closed.is_outside(&long(21)));

        let inverted = ThresholdRange::parse("@10:20", LONG).unwrap();
        assert!(inverted.is_negated());
        assert!(!inverted.is_outside(&long(9)));
        assert!(inverted.is_outside(&long(10)));
        assert!(inverted.is_outside(&long(15)));
        assert!(inverted.is_outside(&long(20)));
        assert!(!inverted.is_outside(&long(21)));
    }

    #[test]
    fn test_invalid_syntax() {
        for text in ["", "abc", "-5", "10:20:30", "@10", "@~:10", "~:", ":5", "1e5", "10..5", " 10", "@:5"] {
            let err = ThresholdRange::parse_syntax(text).unwrap_err();
            assert!(
                matches!(err, ProbeError::InvalidThresholdSyntax(_)),
                "expected syntax error for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_operands_follow_value_family() {
        // same text, two families
        assert!(ThresholdRange::parse("10.5:20", DOUBLE).is_ok());
        let err = ThresholdRange::parse("10.5:20", LONG).unwrap_err();
        assert!(matches!(err, ProbeError::ThresholdValueFormat { expected, .. } if expected == LONG));

        let int = NumericFamily::Integral(IntWidth::W32);
        assert!(ThresholdRange::parse("3000000000", int).is_err());
        assert!(ThresholdRange::parse("3000000000", LONG).is_ok());
    }

    #[test]
    fn test_real_and_big_values() {
        let range = ThresholdRange::parse("0.5:1.5", DOUBLE).unwrap();
        assert!(range.is_outside(&NumericValue::from(0.49f64)));
        assert!(!range.is_outside(&NumericValue::from(1.0f64)));
        assert!(!range.is_outside(&NumericValue::from(f64::NAN)));

        let big = NumericFamily::ArbitraryPrecision(Precision::Integer);
        let range = ThresholdRange::parse("~:99999999999999999999", big).unwrap();
        let value = big.parse("100000000000000000000").unwrap();
        assert!(range.is_outside(&value));
    }

    #[test]
    fn test_render_and_reparse_is_stable() {
        for text in ["10", "10:", "~:10", "10:20", "@10:20", "0.5:2.25", "3.0:"] {
            for family in [DOUBLE, NumericFamily::ArbitraryPrecision(Precision::Decimal)] {
                let parsed = ThresholdRange::parse(text, family).unwrap();
                let reparsed = ThresholdRange::parse(&parsed.to_string(), family).unwrap();
                assert_eq!(parsed, reparsed, "{} in {}", text, family);
            }
        }
        // tiny and huge operands must not render in exponent notation
        let decimal = NumericFamily::ArbitraryPrecision(Precision::Decimal);
        for text in ["0.0000001:", "0.00000000000000000001:5", "@0.000001:0.00001", "~:100000000000000000000000.5"] {
            let parsed = ThresholdRange::parse(text, decimal).unwrap();
            let rendered = parsed.to_string();
            assert!(!rendered.contains(['E', 'e']), "{} rendered as {}", text, rendered);
            assert_eq!(ThresholdRange::parse(&rendered, decimal).unwrap(), parsed, "{}", text);
        }
        for text in ["10", "10:", "~:10", "10:20", "@10:20"] {
            let parsed = ThresholdRange::parse(text, LONG).unwrap();
            assert_eq!(ThresholdRange::parse(&parsed.to_string(), LONG).unwrap(), parsed);
        }
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(ThresholdRange::parse_syntax("10").unwrap().to_string(), "0:10");
        assert_eq!(ThresholdRange::parse_syntax("10:").unwrap().to_string(), "10:");
        assert_eq!(ThresholdRange::parse_syntax("~:10").unwrap().to_string(), "~:10");
        assert_eq!(ThresholdRange::parse_syntax("@1:2").unwrap().to_string(), "@1:2");
    }
}
