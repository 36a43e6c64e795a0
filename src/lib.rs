// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod parsing;
pub mod threshold;
pub mod status;
pub mod source;
pub mod collector;
pub mod report;
pub mod output;
pub mod probe;

// Re-export commonly used items
pub use types::*;
pub use error::{ProbeError, Result};
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use parsing::{IntWidth, NumericFamily, NumericValue, Precision, RealWidth};
pub use threshold::ThresholdRange;
pub use status::{evaluate, evaluate_all};
pub use source::{JolokiaSource, MetricSource, ObjectName, RawValue, StaticSource};
pub use collector::MetricsCollector;
pub use report::{Report, ReportSummary};
pub use output::{error_chain, render_attribute_list, render_failure, render_report, sanitize_label};
pub use probe::{run_probe, ProbeOutcome};
