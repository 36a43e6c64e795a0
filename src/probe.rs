use tracing::info;

use crate::collector::{Collected, MetricsCollector};
use crate::error::Result;
use crate::output::{render_attribute_list, render_report};
use crate::report::{Report, Thresholds};
use crate::source::MetricSource;
use crate::status::evaluate_all;
use crate::types::{Config, Severity};

/// Final outcome of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Report(Report),
    AttributeList(Vec<String>),
}

impl ProbeOutcome {
    pub fn severity(&self) -> Severity {
        match self {
            ProbeOutcome::Report(report) => report.severity,
            ProbeOutcome::AttributeList(_) => Severity::Ok,
        }
    }

    pub fn render(&self) -> String {
        match self {
            ProbeOutcome::Report(report) => render_report(report),
            ProbeOutcome::AttributeList(names) => render_attribute_list(names),
        }
    }
}

/// Fetch, evaluate and build the report for one configured check.
pub async fn run_probe<S: MetricSource>(source: &S, cfg: &Config) -> Result<ProbeOutcome> {
    let descriptors = if cfg.list_attributes {
        Vec::new()
    } else {
        cfg.descriptors()?
    };

    let collection = MetricsCollector::new(source, cfg).collect(&descriptors).await?;

    let values = match collection.collected {
        Collected::AttributeNames(names) => {
            return Ok(ProbeOutcome::AttributeList(names.into_iter().collect()));
        }
        Collected::Missing(_) => return Ok(ProbeOutcome::Report(Report::empty(Severity::Ok))),
        Collected::Values(values) => values,
    };

    let thresholds = Thresholds {
        warning: cfg.warning.as_deref(),
        critical: cfg.critical.as_deref(),
    };
    let severity = evaluate_all(&values, thresholds.warning, thresholds.critical)?;
    info!("{} metrics evaluated: {:?}", values.len(), severity);

    let report = Report::build(
        severity,
        &collection.object,
        &descriptors,
        &values,
        cfg.unit,
        thresholds,
        cfg.performance_data,
    )?;
    Ok(ProbeOutcome::Report(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RawValue, StaticSource};

    fn config(object: &str, attributes: &[&str]) -> Config {
        Config {
            service_url: "static".to_string(),
            username: None,
            password: None,
            object_name: object.to_string(),
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
            attribute_keys: Vec::new(),
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
    fn test_run_probe_ok() {
        let source = StaticSource::new().with_attribute("a:type=b", "Count", 3i64);
        let cfg = Config {
            critical: Some(vec![Some("5".to_string())]),
            ..config("a:type=b", &["Count"])
        };

        let outcome = tokio_test::block_on(run_probe(&source, &cfg)).unwrap();
        assert_eq!(outcome.severity(), Severity::Ok);
        assert_eq!(outcome.render(), "JMX OK - Count=3");
    }

    #[test]
    fn test_composite_without_key_is_text() {
        let usage = RawValue::composite([("used", RawValue::from(1i64))]);
        let source = StaticSource::new().with_attribute("a:type=b", "Usage", usage);
        let cfg = Config {
            critical: Some(vec![Some(r"\{used=\d+\}".to_string())]),
            ..config("a:type=b", &["Usage"])
        };

        let outcome = tokio_test::block_on(run_probe(&source, &cfg)).unwrap();
        assert_eq!(outcome.severity(), Severity::Ok);
        assert_eq!(outcome.render(), "JMX OK - Usage={used=1}");
    }

    #[test]
    fn test_malformed_object_name_fails_before_fetching() {
        let source = StaticSource::new();
        let err = tokio_test::block_on(run_probe(&source, &config("no-colon", &["Count"]))).unwrap_err();
        assert!(matches!(err, crate::error::ProbeError::MalformedPattern(_)));
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(source.open_connections(), 0);
    }
}
