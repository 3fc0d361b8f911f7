use super::store_ref;
use crate::cli::FoldArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use annealyze::{engine::progress::ProgressReporter, workflows};
use tracing::info;

pub fn run(args: FoldArgs) -> Result<()> {
    let partial_config = PartialConfig::load_optional(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let (config, store) = partial_config.merge_fold(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let report = workflows::fold::run(&config, store_ref(&store), &reporter)?;

    println!(
        "RNA '{}' (pseudoknot penalty {}, mu {})",
        report.rna_name, report.pseudoknot_penalty, report.mu
    );
    match report.reference_energy {
        Some(energy) => println!(
            "  reference  {:>10.4}  {}",
            energy, report.reference_dot_bracket
        ),
        None => println!("  reference  {:>10}  (no reference stems)", "-"),
    }
    println!(
        "  {} reference stem(s) reachable from the potential stems",
        report.reachable_reference_stems
    );
    for candidate in &report.candidates {
        println!(
            "  rank {:<5} {:>10.4}  {}",
            candidate.rank, candidate.energy, candidate.dot_bracket
        );
    }
    if let Some(best) = report.lowest_energy() {
        println!(
            "✓ Lowest energy {:.4} at rank {}.",
            best.energy, best.rank
        );
    }

    if let Some(path) = &args.output {
        workflows::fold::save_report(&report, path)?;
        println!("Report written to: {}", path.display());
    }
    Ok(())
}
