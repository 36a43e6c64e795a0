use crate::report::{PerformanceEntry, Report};
use crate::types::{MetricValue, Severity, Unit};

/// Render a report as one plugin output line.
///
/// `<prefix><label>=<value><unit>;...[ | '<label>'=<value><unit>;w;c;min;max ...]`
pub fn render_report(report: &Report) -> String {
    let mut out = String::from(report.severity.message_prefix());

    let status: Vec<String> = report
        .entries
        .iter()
        .map(|e| format!("{}={}{}", e.label, e.value, unit_suffix(e.unit)))
        .collect();
    out.push_str(&status.join(";"));

    if let Some(perf) = report.performance.as_ref().filter(|p| !p.is_empty()) {
        out.push_str(" | ");
        let items: Vec<String> = perf.iter().map(render_performance).collect();
        out.push_str(&items.join(" "));
    }
    out
}

/// Attribute names of one object, as reported in listing mode.
pub fn render_attribute_list<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
    format!("{}{}", Severity::Ok.message_prefix(), names.join(";"))
}

/// Output for a run that failed before a report could be built.
pub fn render_failure(severity: Severity, message: &str) -> String {
    format!("{}{}", severity.message_prefix(), message)
}

/// Display text of an error and each of its sources, outermost first.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

fn render_performance(entry: &PerformanceEntry) -> String {
    // null shows as 0 here, unlike the status section
    let value = match &entry.value {
        MetricValue::Null => "0".to_string(),
        other => other.to_string(),
    };
    format!(
        "'{}'={}{};{};{};{};{}",
        sanitize_label(&entry.label),
        value,
        unit_suffix(entry.unit),
        entry.warning.as_deref().unwrap_or_default(),
        entry.critical.as_deref().unwrap_or_default(),
        entry.min.as_deref().unwrap_or_default(),
        entry.max.as_deref().unwrap_or_default(),
    )
}

fn unit_suffix(unit: Option<Unit>) -> &'static str {
    unit.map_or("", |u| u.abbreviation())
}

pub fn sanitize_label(label: &str) -> String {
    label.replace([' ', '=', ';', '\''], "_")
}
