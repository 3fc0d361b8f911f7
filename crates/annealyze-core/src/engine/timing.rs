use crate::core::io::results::{LoadedResult, SolverBackend};
use crate::engine::error::EngineError;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

/// Format of the task metadata timestamps, e.g. `2022-01-01T00:00:02.500Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

const MICROSECONDS_PER_SECOND: f64 = 1e6;

/// Timings of one solver run, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingReport {
    /// Wall-clock time of the sampling call as seen by the submitting process.
    pub local_time: f64,
    /// Time between task creation and completion.
    pub task_time: Option<f64>,
    /// QPU programming, sampling, access overhead and post-processing time.
    pub qa_total_time: Option<f64>,
    pub qa_access_time: Option<f64>,
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, EngineError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
        EngineError::Timestamp {
            value: value.to_string(),
            source,
        }
    })
}

/// Extracts the timing breakdown of a loaded result.
///
/// Simulated annealers only report `local_time`; quantum annealer results also need the task
/// metadata with its D-Wave timing block.
pub fn timing_report(result: &LoadedResult) -> Result<TimingReport, EngineError> {
    let local_time = result.payload.time;
    if result.backend != SolverBackend::DwaveQa {
        info!(backend = %result.backend, local_time, "Simulated annealer reports local time only.");
        return Ok(TimingReport {
            local_time,
            task_time: None,
            qa_total_time: None,
            qa_access_time: None,
        });
    }

    let task = result
        .task_result
        .as_ref()
        .ok_or(EngineError::MissingMetadata("taskMetadata"))?;
    let start = parse_timestamp(&task.task_metadata.created_at)?;
    let ended_at = task
        .task_metadata
        .ended_at
        .as_deref()
        .ok_or(EngineError::MissingMetadata("taskMetadata.endedAt"))?;
    let end = parse_timestamp(ended_at)?;
    let elapsed = (end - start)
        .num_microseconds()
        .ok_or_else(|| EngineError::Internal("task duration overflows".to_string()))?;

    let timing = task
        .additional_metadata
        .dwave_metadata
        .as_ref()
        .ok_or(EngineError::MissingMetadata("additionalMetadata.dwaveMetadata"))?
        .timing;
    let qa_total = timing.qpu_programming_time
        + timing.qpu_sampling_time
        + timing.qpu_access_overhead_time
        + timing.total_post_processing_time;

    Ok(TimingReport {
        local_time,
        task_time: Some(elapsed as f64 / MICROSECONDS_PER_SECOND),
        qa_total_time: Some(qa_total / MICROSECONDS_PER_SECOND),
        qa_access_time: Some(timing.qpu_access_time / MICROSECONDS_PER_SECOND),
    })
}
