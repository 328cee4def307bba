use crate::compiler::{Dialect, GeneratedScript};
use crate::config::Config;
use crate::output::{self, OutputFormatter, text};
use crate::recorder::{Recorder, RecordingReport, StopReason};
use crate::utils::format_epoch_ms;
use crate::{RecorderError, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct RecordOutcome {
    pub report: RecordingReport,
    pub script: GeneratedScript,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

impl OutputFormatter for RecordOutcome {
    fn format_text(&self) -> String {
        let report = &self.report;
        let stopped = match report.stop_reason {
            StopReason::Requested => "stopped by user",
            StopReason::TargetClosed => "recording window closed",
        };

        let mut lines = vec![
            text::success(&format!(
                "Recorded {} steps ({})",
                report.steps.len(),
                stopped
            )),
            text::key_value("URL", &report.target_url),
            text::key_value("Duration", &text::format_duration_ms(report.duration_ms())),
            text::key_value(
                "Screenshots",
                &format!("{}/{}", report.captured_artifacts(), report.steps.len()),
            ),
        ];

        if !report.steps.is_empty() {
            lines.push(text::subsection("Steps"));
            for (i, step) in report.steps.iter().enumerate() {
                lines.push(text::bullet(&format!(
                    "{:>3}. {} at {}",
                    i + 1,
                    step.action,
                    format_epoch_ms(step.timestamp)
                )));
            }
        }

        if let Some(ref path) = self.report_path {
            lines.push(text::key_value("Report", &path.display().to_string()));
        }

        match self.script_path {
            Some(ref path) => lines.push(text::key_value(
                &format!("{} script", self.script.dialect.framework()),
                &path.display().to_string(),
            )),
            None => {
                lines.push(text::section(&format!(
                    "Generated {} ({})",
                    self.script.dialect.framework(),
                    self.script.dialect
                )));
                lines.push(self.script.source_text.trim_end().to_string());
            }
        }

        lines.join("\n")
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

pub struct RecordOptions {
    pub url: String,
    pub dialect: Dialect,
    pub duration: Option<u64>,
    pub output: Option<PathBuf>,
    pub save_report: Option<PathBuf>,
}

/// Records until Ctrl+C, the window closing, or the optional duration elapsing.
pub async fn handle_record(config: &Config, options: RecordOptions) -> Result<RecordOutcome> {
    let mut recorder = Recorder::from_config(config);
    recorder.start_recording(&options.url).await?;

    eprintln!(
        "{}",
        text::info(&format!(
            "Recording {} (press Ctrl+C or close the window to stop)",
            options.url
        ))
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = wait_duration(options.duration) => {}
        _ = recorder.target_closed() => {}
    }

    let report = match recorder.stop_recording().await? {
        Some(report) => report,
        None => recorder.report().cloned().ok_or(RecorderError::NoRecording)?,
    };

    let script = recorder
        .session()
        .ok_or(RecorderError::NoRecording)?
        .compile(options.dialect, &config.output.script_options())?;

    if let Some(ref path) = options.output {
        std::fs::write(path, &script.source_text)?;
    }
    if let Some(ref path) = options.save_report {
        std::fs::write(path, output::to_json(&report, true)?)?;
    }

    Ok(RecordOutcome {
        report,
        script,
        script_path: options.output,
        report_path: options.save_report,
    })
}

async fn wait_duration(seconds: Option<u64>) {
    match seconds {
        Some(s) => tokio::time::sleep(Duration::from_secs(s)).await,
        None => std::future::pending().await,
    }
}
