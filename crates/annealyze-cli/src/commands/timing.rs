use super::store_ref;
use crate::cli::TimingArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use annealyze::core::io::results;
use annealyze::engine::error::EngineError;
use annealyze::engine::timing::{TimingReport, timing_report};

pub fn run(args: TimingArgs) -> Result<()> {
    let input = PartialConfig::default().resolve_input(&args.input)?;
    let loaded = results::load(input.backend, &input.source, store_ref(&input.store))
        .map_err(EngineError::from)?;
    let report = timing_report(&loaded)?;

    if args.json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Other(e.into()))?;
        println!("{}", text);
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

fn render(report: &TimingReport) -> String {
    let optional = |value: Option<f64>| match value {
        Some(v) => format!("{:.6} s", v),
        None => "-".to_string(),
    };
    format!(
        "local time:     {:.6} s\ntask time:      {}\nqa total time:  {}\nqa access time: {}\n",
        report.local_time,
        optional(report.task_time),
        optional(report.qa_total_time),
        optional(report.qa_access_time),
    )
}
