use crate::error::{ProbeError, Result};
use crate::source::ObjectName;
use crate::types::{MetricDescriptor, MetricValue, Severity, Unit};

/// One `label=value` pair of the status line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub label: String,
    pub value: MetricValue,
    pub unit: Option<Unit>,
}

/// One performance-data item, `'label'=value;warn;crit;min;max`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceEntry {
    pub label: String,
    pub value: MetricValue,
    pub unit: Option<Unit>,
    pub warning: Option<String>,
    pub critical: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Result of one check, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub severity: Severity,
    pub entries: Vec<ReportEntry>,
    /// `None` when performance data was not requested.
    pub performance: Option<Vec<PerformanceEntry>>,
}

/// Threshold slots as configured, one per metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thresholds<'a> {
    pub warning: Option<&'a [Option<String>]>,
    pub critical: Option<&'a [Option<String>]>,
}

impl<'a> Thresholds<'a> {
    fn slot(slots: Option<&'a [Option<String>]>, i: usize) -> Option<String> {
        slots.and_then(|s| s.get(i)).cloned().flatten()
    }
}

impl Report {
    /// A report with no metrics, e.g. when missing attributes are tolerated.
    pub fn empty(severity: Severity) -> Self {
        Self {
            severity,
            entries: Vec::new(),
            performance: None,
        }
    }

    /// Pair descriptors with their resolved values.
    ///
    /// Performance entries are produced for numeric and null values only;
    /// their labels are qualified with the object name.
    pub fn build(
        severity: Severity,
        object: &ObjectName,
        descriptors: &[MetricDescriptor],
        values: &[MetricValue],
        unit: Option<Unit>,
        thresholds: Thresholds<'_>,
        with_performance: bool,
    ) -> Result<Self> {
        if descriptors.len() != values.len() {
            return Err(ProbeError::arity("metric values", descriptors.len(), values.len()));
        }

        let entries = descriptors
            .iter()
            .zip(values)
            .map(|(d, v)| ReportEntry {
                label: d.label(),
                value: v.clone(),
                unit,
            })
            .collect();

        let performance = with_performance.then(|| {
            descriptors
                .iter()
                .zip(values)
                .enumerate()
                .filter(|(_, (_, v))| !matches!(v, MetricValue::Text(_)))
                .map(|(i, (d, v))| PerformanceEntry {
                    label: format!("{}.{}", object, d.label()),
                    value: v.clone(),
                    unit,
                    warning: Thresholds::slot(thresholds.warning, i),
                    critical: Thresholds::slot(thresholds.critical, i),
                    min: None,
                    max: None,
                })
                .collect()
        });

        Ok(Self {
            severity,
            entries,
            performance,
        })
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            metric_count: self.entries.len(),
            null_count: self.entries.iter().filter(|e| e.value.is_null()).count(),
            performance_count: self.performance.as_ref().map_or(0, Vec::len),
        }
    }
}

pub struct ReportSummary {
    pub metric_count: usize,
    pub null_count: usize,
    pub performance_count: usize,
}
