use thiserror::Error;

use crate::parsing::NumericFamily;
use crate::types::Severity;

/// Every failure the probe can surface to the caller.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Error parsing threshold. Unknown threshold range format [{0}]")]
    InvalidThresholdSyntax(String),

    #[error("Error parsing threshold value [{value}]. Expected [{expected}]")]
    ThresholdValueFormat { value: String, expected: NumericFamily },

    #[error("Error parsing threshold regex [{pattern}]: {reason}")]
    ThresholdPattern { pattern: String, reason: String },

    #[error("{what}: expected {expected} entries, got {actual}")]
    ArityMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("attributeKey not found [{0}]")]
    CompositeKeyNotFound(String),

    #[error("attributeName not found [{0}]")]
    AttributeNotFound(String),

    #[error("objectName not found [{0}]")]
    InstanceNotFound(String),

    #[error("Object name not unique: objectName pattern matches {matches} MBeans")]
    AmbiguousPattern { pattern: String, matches: usize },

    #[error("Malformed objectName [{0}]")]
    MalformedPattern(String),

    #[error("Error opening connection: {0}")]
    Connection(String),

    #[error("Error invoking operation [{operation}]: {reason}")]
    Operation { operation: String, reason: String },

    #[error("Can't handle value type [{0}]")]
    UnsupportedValueType(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

impl ProbeError {
    pub fn arity(what: &'static str, expected: usize, actual: usize) -> Self {
        ProbeError::ArityMismatch {
            what,
            expected,
            actual,
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        ProbeError::Config(msg.into())
    }

    pub fn connection<S: Into<String>>(msg: S) -> Self {
        ProbeError::Connection(msg.into())
    }

    /// Missing attributes and composite keys may be tolerated by policy.
    pub fn is_missing_metric(&self) -> bool {
        matches!(
            self,
            ProbeError::AttributeNotFound(_) | ProbeError::CompositeKeyNotFound(_)
        )
    }

    /// Severity reported when this error aborts a run.
    ///
    /// Parse and usage failures are UNKNOWN; anything that went wrong while
    /// talking to the monitored resource is CRITICAL.
    pub fn severity(&self) -> Severity {
        match self {
            ProbeError::InvalidThresholdSyntax(_)
            | ProbeError::ThresholdValueFormat { .. }
            | ProbeError::ThresholdPattern { .. }
            | ProbeError::ArityMismatch { .. }
            | ProbeError::UnsupportedValueType(_)
            | ProbeError::Config(_) => Severity::Unknown,
            ProbeError::CompositeKeyNotFound(_)
            | ProbeError::AttributeNotFound(_)
            | ProbeError::InstanceNotFound(_)
            | ProbeError::AmbiguousPattern { .. }
            | ProbeError::MalformedPattern(_)
            | ProbeError::Connection(_)
            | ProbeError::Operation { .. } => Severity::Critical,
        }
    }
}
