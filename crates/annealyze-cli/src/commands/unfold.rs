use super::store_ref;
use crate::cli::UnfoldArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use annealyze::{engine::progress::ProgressReporter, workflows};
use tracing::{info, warn};

pub fn run(args: UnfoldArgs) -> Result<()> {
    let partial_config = PartialConfig::load_optional(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let (config, store) = partial_config.merge_unfold(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Evaluating the top {} samples of '{}'...",
        config.selection.top_n, config.input.backend
    );
    let result = workflows::unfold::run(&config, store_ref(&store), &reporter)?;
    let volume = &result.parameters.volume;

    if result.accepted() {
        println!(
            "✓ Accepted sample of rank {} (gain {:.4}, volume {:.4} -> {:.4}).",
            volume.optimize_info.result_rank, volume.gain, volume.initial, volume.optimize
        );
    } else {
        warn!("No candidate improved the volume; keeping the template geometry.");
        println!(
            "Warning: none of the {} samples examined improved the volume. Writing the template geometry.",
            volume.optimize_info.result_rank
        );
    }

    let saved = workflows::unfold::save(&result, &config)?;
    println!("Structure written to: {}", saved.structure.display());
    println!("Parameters written to: {}", saved.parameters.display());
    Ok(())
}
