use super::compile::StepsInput;
use crate::output::{self, OutputFormatter, text};
use crate::recorder::{ArtifactRef, RecordedStep, StepStore};
use crate::utils::format_epoch_ms;
use crate::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct StepView {
    /// 1-based, as shown to users.
    pub number: usize,
    pub action: String,
    pub timestamp: u64,
    pub recorded_at: String,
    pub artifact: ArtifactRef,
}

impl StepView {
    fn new(index: usize, step: &RecordedStep) -> Self {
        Self {
            number: index + 1,
            action: step.action.clone(),
            timestamp: step.timestamp,
            recorded_at: format_epoch_ms(step.timestamp),
            artifact: step.artifact.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InspectResult {
    pub total_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<StepView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepView>,
}

impl OutputFormatter for InspectResult {
    fn format_text(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref url) = self.target_url {
            lines.push(text::key_value("URL", url));
        }

        match &self.current {
            Some(step) => {
                lines.push(text::section(&format!(
                    "Step {} of {}",
                    step.number, self.total_steps
                )));
                lines.push(text::key_value("Action", &step.action));
                lines.push(text::key_value("Time", &step.recorded_at));
                lines.push(text::key_value("Screenshot", &step.artifact.to_string()));
            }
            None if self.steps.is_empty() => lines.push(text::info("No steps recorded")),
            None => {
                let mut table = output::TableBuilder::new().headers(vec![
                    "#".into(),
                    "Action".into(),
                    "Time".into(),
                ]);
                for step in &self.steps {
                    table = table.row(vec![
                        step.number.to_string(),
                        text::truncate(&step.action, 20),
                        step.recorded_at.clone(),
                    ]);
                }
                lines.push(table.build().trim_end().to_string());
            }
        }

        lines.join("\n")
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

/// Lists a saved recording, or moves the cursor to `step` (0-based) and shows it.
pub fn handle_inspect(input: &Path, step: Option<usize>) -> Result<InspectResult> {
    let loaded = StepsInput::load(input)?;
    let mut store = StepStore::from_sequence(loaded.steps());
    let target_url = loaded.target_url().map(String::from);

    let Some(index) = step else {
        return Ok(InspectResult {
            total_steps: store.len(),
            target_url,
            current: None,
            steps: store
                .steps()
                .iter()
                .enumerate()
                .map(|(i, s)| StepView::new(i, s))
                .collect(),
        });
    };

    let current = StepView::new(index, store.set_cursor(index)?);
    Ok(InspectResult {
        total_steps: store.len(),
        target_url,
        current: Some(current),
        steps: Vec::new(),
    })
}
