use annealyze::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const SPINNER_TICK_MS: u64 = 80;

/// Renders workflow progress on stderr: a spinner per phase and a bar over the ranked window.
///
/// The bar position is the rank of the last scanned sample; the prefix carries the best gain
/// (unfolding) or the lowest energy (folding) seen so far.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: ProgressBar,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(Self::spinner_style());
        pb.finish_and_clear();
        Self { pb }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();

        Box::new(move |progress: Progress| match progress {
            Progress::PhaseStart { name } => {
                pb.reset();
                pb.set_length(0);
                pb.set_prefix("");
                pb.set_style(Self::spinner_style());
                pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                pb.set_message(name);
            }
            Progress::PhaseFinish => {
                pb.disable_steady_tick();
                pb.finish_with_message("✓ Done");
            }
            Progress::ScanStart { samples } => {
                pb.disable_steady_tick();
                pb.set_length(samples);
                pb.set_position(0);
                pb.set_style(Self::scan_style());
            }
            Progress::SampleScanned { rank } => pb.set_position(rank as u64),
            Progress::ScanFinish => {
                let scanned = pb.position();
                pb.set_message(format!("{} sample(s) scanned", scanned));
                pb.finish();
            }
            Progress::CandidateAccepted { rank, gain } => {
                pb.set_prefix(format!("best gain {:.3} @ rank {}", gain, rank));
            }
            Progress::LowestEnergy { rank, energy } => {
                pb.set_prefix(format!("lowest {:.3} @ rank {}", energy, rank));
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Failed to create spinner style template")
    }

    fn scan_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{msg:<22} [{bar:40.cyan/blue}] rank {pos}/{len} {prefix:.yellow}",
        )
        .expect("Failed to create scan style template")
        .progress_chars("=>-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn replay(handler: &CliProgressHandler, events: Vec<Progress>) {
        let callback = handler.get_callback();
        for event in events {
            callback(event);
        }
    }

    #[test]
    fn handler_starts_finished_and_empty() {
        let handler = CliProgressHandler::new();
        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.length(), Some(0));
    }

    #[test]
    fn unfolding_scan_tracks_rank_and_best_gain() {
        let handler = CliProgressHandler::new();
        replay(
            &handler,
            vec![
                Progress::PhaseStart {
                    name: "Evaluating Candidates",
                },
                Progress::ScanStart { samples: 5 },
                Progress::SampleScanned { rank: 1 },
                Progress::SampleScanned { rank: 2 },
                Progress::CandidateAccepted { rank: 2, gain: 1.25 },
            ],
        );
        assert_eq!(handler.pb.message(), "Evaluating Candidates");
        assert_eq!(handler.pb.length(), Some(5));
        assert_eq!(handler.pb.position(), 2);
        assert_eq!(handler.pb.prefix(), "best gain 1.250 @ rank 2");

        replay(&handler, vec![Progress::ScanFinish]);
        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.message(), "2 sample(s) scanned");
    }

    #[test]
    fn folding_scan_reports_lowest_energy_and_phase_end() {
        let handler = CliProgressHandler::new();
        replay(
            &handler,
            vec![
                Progress::PhaseStart {
                    name: "Scoring Candidates",
                },
                Progress::ScanStart { samples: 2 },
                Progress::LowestEnergy {
                    rank: 1,
                    energy: -19.2,
                },
                Progress::SampleScanned { rank: 1 },
                Progress::SampleScanned { rank: 2 },
                Progress::ScanFinish,
                Progress::PhaseFinish,
            ],
        );
        assert_eq!(handler.pb.prefix(), "lowest -19.200 @ rank 1");
        assert_eq!(handler.pb.position(), 2);
        assert_eq!(handler.pb.message(), "✓ Done");
    }

    #[test]
    fn new_phase_clears_previous_scan() {
        let handler = CliProgressHandler::new();
        replay(
            &handler,
            vec![
                Progress::ScanStart { samples: 3 },
                Progress::CandidateAccepted { rank: 1, gain: 2.0 },
                Progress::PhaseStart {
                    name: "Loading Inputs",
                },
            ],
        );
        assert_eq!(handler.pb.prefix(), "");
        assert_eq!(handler.pb.length(), Some(0));
        assert!(!handler.pb.is_finished());
    }

    #[test]
    fn callback_can_be_driven_from_another_thread() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Loading Inputs",
            });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.message(), "✓ Done");
    }
}
