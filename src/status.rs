use regex::Regex;
use tracing::debug;

use crate::error::{ProbeError, Result};
use crate::parsing::NumericValue;
use crate::threshold::ThresholdRange;
use crate::types::{MetricValue, Severity};

/// Decide the status of a single metric.
///
/// Numeric values are tested against range thresholds parsed in the value's
/// own numeric family; textual values treat thresholds as regular
/// expressions. Critical is always tested before warning. A null value is
/// critical regardless of thresholds.
pub fn evaluate(value: &MetricValue, warning: Option<&str>, critical: Option<&str>) -> Result<Severity> {
    let tested = match value {
        MetricValue::Null => return Ok(Severity::Critical),
        MetricValue::Numeric(n) => Tested::Numeric(n),
        MetricValue::Text(s) => Tested::Text(s),
    };
    if tested.triggers(critical)? {
        Ok(Severity::Critical)
    } else if tested.triggers(warning)? {
        Ok(Severity::Warning)
    } else {
        Ok(Severity::Ok)
    }
}

/// Worst status across a batch.
///
/// Threshold slices, when given, must have one slot per value; the check runs
/// before anything is evaluated.
pub fn evaluate_all(
    values: &[MetricValue],
    warnings: Option<&[Option<String>]>,
    criticals: Option<&[Option<String>]>,
) -> Result<Severity> {
    if let Some(w) = warnings {
        if w.len() != values.len() {
            return Err(ProbeError::arity("warning thresholds", values.len(), w.len()));
        }
    }
    if let Some(c) = criticals {
        if c.len() != values.len() {
            return Err(ProbeError::arity("critical thresholds", values.len(), c.len()));
        }
    }

    let mut worst = Severity::Ok;
    for (i, value) in values.iter().enumerate() {
        let status = evaluate(value, slot(warnings, i), slot(criticals, i))?;
        debug!("metric #{} = {} -> {:?}", i, value, status);
        worst = worst.max(status);
    }
    Ok(worst)
}

fn slot(thresholds: Option<&[Option<String>]>, i: usize) -> Option<&str> {
    thresholds.and_then(|t| t[i].as_deref())
}

/// A non-null value under test.
enum Tested<'v> {
    Numeric(&'v NumericValue),
    Text(&'v str),
}

impl Tested<'_> {
    fn triggers(&self, threshold: Option<&str>) -> Result<bool> {
        let Some(threshold) = threshold else {
            return Ok(false);
        };
        match self {
            Tested::Numeric(n) => Ok(ThresholdRange::parse(threshold, n.family())?.is_outside(n)),
            Tested::Text(s) => pattern_triggered(s, threshold),
        }
    }
}

/// `PATTERN` alerts when the value does not fully match; `@PATTERN` alerts
/// when it does.
pub fn pattern_triggered(value: &str, threshold: &str) -> Result<bool> {
    let (pattern, inverted) = match threshold.strip_prefix('@') {
        Some(p) => (p, true),
        None => (threshold, false),
    };
    let re = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| ProbeError::ThresholdPattern {
        pattern: threshold.to_string(),
        reason: e.to_string(),
    })?;
    let full_match = re.is_match(value);
    Ok(full_match == inverted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(items: &[&str]) -> Vec<Option<String>> {
        items
            .iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect()
    }

    #[test]
    fn test_critical_checked_first() {
        let value = MetricValue::from(75i64);
        assert_eq!(evaluate(&value, Some("70:90"), Some("~:50")).unwrap(), Severity::Critical);
    }

    #[test]
    fn test_warning_and_ok() {
        let value = MetricValue::from(80i64);
        assert_eq!(evaluate(&value, Some("~:70"), Some("~:90")).unwrap(), Severity::Warning);
        assert_eq!(evaluate(&value, Some("~:85"), Some("~:90")).unwrap(), Severity::Ok);
        assert_eq!(evaluate(&value, None, None).unwrap(), Severity::Ok);
    }

    #[test]
    fn test_critical_dominates_warning() {
        // warning range contains every value, critical excludes everything above 50
        for v in [0i64, 5, 49, 50, 51, 100, 1_000] {
            let value = MetricValue::from(v);
            let status = evaluate(&value, Some("0:1000"), Some("~:50")).unwrap();
            let expected = if v > 50 { Severity::Critical } else { Severity::Ok };
            assert_eq!(status, expected, "value {}", v);
        }

        // both tiers breached: critical wins
        let status = evaluate(&MetricValue::from(2_000i64), Some("0:1000"), Some("~:50")).unwrap();
        assert_eq!(status, Severity::Critical);
    }

    #[test]
    fn test_null_is_critical() {
        assert_eq!(evaluate(&MetricValue::Null, None, None).unwrap(), Severity::Critical);
        assert_eq!(
            evaluate(&MetricValue::Null, Some("not a range"), Some("~:10")).unwrap(),
            Severity::Critical
        );
    }

    #[test]
    fn test_inverted_range() {
        let value = MetricValue::from(15i64);
        assert_eq!(evaluate(&value, Some("@10:20"), None).unwrap(), Severity::Warning);
        assert_eq!(evaluate(&value, None, Some("@10:20")).unwrap(), Severity::Critical);
    }

    #[test]
    fn test_text_thresholds_are_patterns() {
        let running = MetricValue::from("RUNNING");
        assert_eq!(evaluate(&running, None, Some("RUNNING|STARTING")).unwrap(), Severity::Ok);
        assert_eq!(evaluate(&running, None, Some("STOPPED")).unwrap(), Severity::Critical);
        assert_eq!(evaluate(&running, Some("@RUN.*"), None).unwrap(), Severity::Warning);

        // full match only
        assert_eq!(evaluate(&running, None, Some("RUN")).unwrap(), Severity::Critical);
    }

    #[test]
    fn test_bad_pattern() {
        let err = evaluate(&MetricValue::from("x"), None, Some("(unclosed")).unwrap_err();
        assert!(matches!(err, ProbeError::ThresholdPattern { .. }));
    }

    #[test]
    fn test_bad_range_on_numeric_value() {
        let err = evaluate(&MetricValue::from(1i64), Some("abc"), None).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidThresholdSyntax(_)));
    }

    #[test]
    fn test_evaluate_all_empty_is_ok() {
        assert_eq!(evaluate_all(&[], None, None).unwrap(), Severity::Ok);
        assert_eq!(evaluate_all(&[], Some(&[][..]), Some(&[][..])).unwrap(), Severity::Ok);
    }

    #[test]
    fn test_evaluate_all_worst_wins() {
        let values = vec![MetricValue::from(5i64), MetricValue::from(80i64), MetricValue::from(2.5f64)];
        let warnings = slots(&["~:10", "~:70", ""]);
        let criticals = slots(&["~:20", "~:90", "~:2"]);
        let status = evaluate_all(&values, Some(warnings.as_slice()), Some(criticals.as_slice())).unwrap();
        assert_eq!(status, Severity::Critical);

        let criticals = slots(&["~:20", "~:90", "~:3"]);
        let status = evaluate_all(&values, Some(warnings.as_slice()), Some(criticals.as_slice())).unwrap();
        assert_eq!(status, Severity::Warning);
    }

    #[test]
    fn test_same_threshold_text_across_families() {
        let values = vec![
            MetricValue::from(7i32),
            MetricValue::from(7.5f64),
            MetricValue::from("10"),
        ];
        let criticals = slots(&["10", "10", "10"]);
        assert_eq!(evaluate_all(&values, None, Some(criticals.as_slice())).unwrap(), Severity::Ok);
    }

    #[test]
    fn test_arity_checked_before_evaluation() {
        // the first slot would fail to parse if it were evaluated
        let values = vec![MetricValue::from(1i64), MetricValue::from(2i64)];
        let warnings = slots(&["garbage"]);
        let err = evaluate_all(&values, Some(warnings.as_slice()), None).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::ArityMismatch { expected: 2, actual: 1, .. }
        ));

        let criticals = slots(&["1", "2", "3"]);
        let err = evaluate_all(&values, None, Some(criticals.as_slice())).unwrap_err();
        assert!(matches!(err, ProbeError::ArityMismatch { .. }));
    }
}
