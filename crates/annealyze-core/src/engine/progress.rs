#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// Scanning of a window of ranked samples begins.
    ScanStart { samples: u64 },
    /// The sample of this 1-based rank has been evaluated.
    SampleScanned { rank: usize },
    ScanFinish,

    /// A torsion assignment from the sample of this rank was accepted with this gain.
    CandidateAccepted { rank: usize, gain: f64 },
    /// The sample of this rank has the lowest stem energy scored so far.
    LowestEnergy { rank: usize, energy: f64 },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::PhaseFinish);
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                seen.lock().unwrap().push(event);
            }));
            reporter.report(Progress::PhaseStart { name: "Ranking" });
            reporter.report(Progress::CandidateAccepted { rank: 2, gain: 1.5 });
        }
        assert_eq!(
            seen.into_inner().unwrap(),
            vec![
                Progress::PhaseStart { name: "Ranking" },
                Progress::CandidateAccepted { rank: 2, gain: 1.5 },
            ]
        );
    }
}
