use super::models::RecordingReport;
use std::collections::BTreeMap;

/// Runs once for every session that reaches `Stopped`.
pub trait AnalysisHook: Send + Sync {
    fn on_recording_stopped(&self, report: &RecordingReport);
}

/// Logs a per-action breakdown of the finished recording.
pub struct LoggingAnalysisHook;

impl AnalysisHook for LoggingAnalysisHook {
    fn on_recording_stopped(&self, report: &RecordingReport) {
        let breakdown = action_breakdown(report);
        tracing::info!(
            session = %report.session_id,
            url = %report.target_url,
            steps = report.steps.len(),
            artifacts = report.captured_artifacts(),
            reason = ?report.stop_reason,
            "Recording finished"
        );
        for (action, count) in breakdown {
            tracing::debug!("  {} x{}", action, count);
        }
    }
}

pub fn action_breakdown(report: &RecordingReport) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for step in report.steps.iter() {
        *counts.entry(step.action.as_str()).or_insert(0) += 1;
    }
    counts
}
