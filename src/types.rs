use std::fmt;
use std::str::FromStr;

use crate::error::ProbeError;
use crate::parsing::NumericValue;

#[derive(Debug, Clone)]
pub struct Config {
    pub service_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub object_name: String,
    pub attributes: Vec<String>,
    pub attribute_keys: Vec<String>,
    pub warning: Option<Vec<Option<String>>>,
    pub critical: Option<Vec<Option<String>>>,
    pub unit: Option<Unit>,
    pub operation: Option<String>,
    pub performance_data: bool,
    pub ignore_missing: bool,
    pub list_attributes: bool,
    pub verbose: bool,
}

impl Config {
    /// Expand attribute names and keys into one descriptor per metric.
    ///
    /// A single attribute with several keys fans out into one descriptor per
    /// key; otherwise keys pair up with attributes by position.
    pub fn descriptors(&self) -> Result<Vec<MetricDescriptor>, ProbeError> {
        let keys = &self.attribute_keys;
        match (self.attributes.as_slice(), keys.len()) {
            (attrs, 0) => Ok(attrs.iter().map(|a| MetricDescriptor::new(a.as_str())).collect()),
            ([attr], _) => Ok(keys
                .iter()
                .map(|k| MetricDescriptor::with_key(attr.as_str(), k.as_str()))
                .collect()),
            (attrs, n) if attrs.len() == n => Ok(attrs
                .iter()
                .zip(keys)
                .map(|(a, k)| MetricDescriptor::with_key(a.as_str(), k.as_str()))
                .collect()),
            (attrs, n) => Err(ProbeError::arity("attribute keys", attrs.len(), n)),
        }
    }
}

/// Plugin status, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }

    pub fn message_prefix(self) -> &'static str {
        match self {
            Severity::Ok => "JMX OK - ",
            Severity::Warning => "JMX WARNING - ",
            Severity::Critical => "JMX CRITICAL - ",
            Severity::Unknown => "JMX UNKNOWN - ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Bytes,
    Kilobytes,
    Megabytes,
    Terabytes,
    Seconds,
    Microseconds,
    Milliseconds,
    Counter,
}

impl Unit {
    const ALL: [Unit; 8] = [
        Unit::Bytes,
        Unit::Kilobytes,
        Unit::Megabytes,
        Unit::Terabytes,
        Unit::Seconds,
        Unit::Microseconds,
        Unit::Milliseconds,
        Unit::Counter,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            Unit::Bytes => "B",
            Unit::Kilobytes => "KB",
            Unit::Megabytes => "MB",
            Unit::Terabytes => "TB",
            Unit::Seconds => "s",
            Unit::Microseconds => "us",
            Unit::Milliseconds => "ms",
            Unit::Counter => "c",
        }
    }
}

impl FromStr for Unit {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|u| u.abbreviation() == s)
            .ok_or_else(|| ProbeError::config(format!("Unknown unit [{}]", s)))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// One metric: an attribute, optionally narrowed to a field of a composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: String,
    pub sub_key: Option<String>,
}

impl MetricDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), sub_key: None }
    }

    pub fn with_key(name: impl Into<String>, sub_key: impl Into<String>) -> Self {
        Self { name: name.into(), sub_key: Some(sub_key.into()) }
    }

    /// `name` or `name.key`.
    pub fn label(&self) -> String {
        match &self.sub_key {
            Some(key) => format!("{}.{}", self.name, key),
            None => self.name.clone(),
        }
    }
}

/// A resolved metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// The resource answered but carried no value.
    Null,
    Numeric(NumericValue),
    Text(String),
}

impl MetricValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }
}

impl From<NumericValue> for MetricValue {
    fn from(value: NumericValue) -> Self {
        MetricValue::Numeric(value)
    }
}

macro_rules! numeric_metric_from {
    ($($t:ty),*) => {
        $(impl From<$t> for MetricValue {
            fn from(value: $t) -> Self {
                MetricValue::Numeric(NumericValue::from(value))
            }
        })*
    };
}

numeric_metric_from!(i8, i16, i32, i64, f32, f64);

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Null => f.write_str("NULL"),
            MetricValue::Numeric(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(attributes: &[&str], keys: &[&str]) -> Config {
        Config {
            service_url: "http://localhost:8778/jolokia".to_string(),
            username: None,
            password: None,
            object_name: "java.lang:type=Memory".to_string(),
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
            attribute_keys: keys.iter().map(|s| s.to_string()).collect(),
            warning: None,
            critical: None,
            unit: None,
            operation: None,
            performance_data: false,
            ignore_missing: false,
            list_attributes: false,
            verbose: false,
        }
    }

    #[test]
    fn test_severity_order_and_codes() {
        assert!(Severity::Ok < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
        assert_eq!(Severity::Unknown.exit_code(), 3);
        assert_eq!(Severity::Critical.message_prefix(), "JMX CRITICAL - ");
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("MB".parse::<Unit>().unwrap(), Unit::Megabytes);
        assert_eq!("us".parse::<Unit>().unwrap(), Unit::Microseconds);
        let err = "GB".parse::<Unit>().unwrap_err();
        assert!(err.to_string().contains("Unknown unit [GB]"));
    }

    #[test]
    fn test_descriptors_without_keys() {
        let cfg = config_with(&["HeapMemoryUsage", "ObjectPendingFinalizationCount"], &[]);
        let descriptors = cfg.descriptors().unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[1].label(), "ObjectPendingFinalizationCount");
    }

    #[test]
    fn test_descriptors_fan_out_single_attribute() {
        let cfg = config_with(&["Usage"], &["used", "committed"]);
        let descriptors = cfg.descriptors().unwrap();
        assert_eq!(
            descriptors,
            vec![
                MetricDescriptor::with_key("Usage", "used"),
                MetricDescriptor::with_key("Usage", "committed"),
            ]
        );
        assert_eq!(descriptors[0].label(), "Usage.used");
    }

    #[test]
    fn test_descriptors_zip_and_mismatch() {
        let cfg = config_with(&["HeapMemoryUsage", "NonHeapMemoryUsage"], &["used", "max"]);
        let descriptors = cfg.descriptors().unwrap();
        assert_eq!(descriptors[1], MetricDescriptor::with_key("NonHeapMemoryUsage", "max"));

        let cfg = config_with(&["A", "B", "C"], &["x", "y"]);
        assert!(matches!(cfg.descriptors(), Err(ProbeError::ArityMismatch { .. })));
    }

    #[test]
    fn test_metric_value_display() {
        assert_eq!(MetricValue::Null.to_string(), "NULL");
        assert_eq!(MetricValue::from(42i64).to_string(), "42");
        assert_eq!(MetricValue::Text("RUNNING".into()).to_string(), "RUNNING");
    }
}
