use std::process::ExitCode;

use jmx_probe::{error_chain, load_config, render_failure, run_probe, JolokiaSource, ProbeOutcome, Severity};
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(false);
            println!("{}", render_failure(Severity::Unknown, &format!("{:#}", e)));
            return exit_with(Severity::Unknown);
        }
    };
    init_tracing(cfg.verbose);
    info!("checking {} on {}", cfg.object_name, cfg.service_url);

    let source = JolokiaSource::from_config(&cfg);
    match run_probe(&source, &cfg).await {
        Ok(outcome) => {
            if let ProbeOutcome::Report(report) = &outcome {
                let summary = report.summary();
                debug!(
                    "{} metrics, {} null, {} performance entries",
                    summary.metric_count, summary.null_count, summary.performance_count
                );
            }
            println!("{}", outcome.render());
            exit_with(outcome.severity())
        }
        Err(e) => {
            let severity = e.severity();
            println!("{}", render_failure(severity, &e.to_string()));
            if cfg.verbose {
                for (depth, cause) in error_chain(&e).iter().enumerate() {
                    error!("{}: {}", depth, cause);
                }
            }
            exit_with(severity)
        }
    }
}

fn exit_with(severity: Severity) -> ExitCode {
    ExitCode::from(severity.exit_code() as u8)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
