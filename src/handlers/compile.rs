use crate::compiler::{self, Dialect, GeneratedScript, ScriptOptions};
use crate::output::{self, OutputFormatter};
use crate::recorder::{RecordingReport, StepSequence, is_action_identifier};
use crate::{RecorderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A saved recording: a full report, or a bare step array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StepsInput {
    Report(RecordingReport),
    Steps(StepSequence),
}

impl StepsInput {
    /// Reads a saved recording and checks it holds what the recorder itself
    /// would have accepted.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let input: Self = serde_json::from_str(&content).map_err(|e| {
            RecorderError::General(format!(
                "{} is neither a recording report nor a step array: {}",
                path.display(),
                e
            ))
        })?;

        input.validate().map_err(|reason| {
            RecorderError::General(format!("{}: {}", path.display(), reason))
        })?;
        Ok(input)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let mut previous = 0;
        for (i, step) in self.steps().iter().enumerate() {
            if !is_action_identifier(&step.action) {
                return Err(format!(
                    "step {} has invalid action '{}'",
                    i + 1,
                    step.action
                ));
            }
            if step.timestamp < previous {
                return Err(format!(
                    "step {} is older than the step before it ({} < {})",
                    i + 1,
                    step.timestamp,
                    previous
                ));
            }
            previous = step.timestamp;
        }
        Ok(())
    }

    pub fn steps(&self) -> &StepSequence {
        match self {
            StepsInput::Report(report) => &report.steps,
            StepsInput::Steps(steps) => steps,
        }
    }

    pub fn target_url(&self) -> Option<&str> {
        match self {
            StepsInput::Report(report) => Some(&report.target_url),
            StepsInput::Steps(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompileResult {
    pub dialect: Dialect,
    pub target_url: String,
    pub steps_compiled: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub source_text: String,
}

impl OutputFormatter for CompileResult {
    fn format_text(&self) -> String {
        match &self.output {
            Some(path) => output::text::success(&format!(
                "Compiled {} steps to {} ({})",
                self.steps_compiled,
                path.display(),
                self.dialect.framework()
            )),
            None => self.source_text.trim_end().to_string(),
        }
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

pub fn handle_compile(
    input: &Path,
    url: Option<&str>,
    dialect: Dialect,
    options: &ScriptOptions,
    output: Option<PathBuf>,
) -> Result<CompileResult> {
    let loaded = StepsInput::load(input)?;

    let target_url = url
        .or(loaded.target_url())
        .ok_or_else(|| {
            RecorderError::InvalidTarget(
                "no target URL in the input file; pass one with --url".into(),
            )
        })?
        .to_string();
    crate::recorder::parse_target_url(&target_url)?;

    let GeneratedScript {
        dialect,
        source_text,
    } = compiler::compile_with(loaded.steps(), &target_url, dialect, options);

    if let Some(ref path) = output {
        fs::write(path, &source_text)?;
    }

    Ok(CompileResult {
        dialect,
        target_url,
        steps_compiled: loaded.steps().len(),
        output,
        source_text,
    })
}

#[derive(Debug, Serialize)]
pub struct DialectInfo {
    pub name: &'static str,
    pub framework: &'static str,
    pub file_extension: &'static str,
    pub default: bool,
}

#[derive(Debug, Serialize)]
pub struct DialectList {
    pub dialects: Vec<DialectInfo>,
}

impl OutputFormatter for DialectList {
    fn format_text(&self) -> String {
        let mut table = output::TableBuilder::new().headers(vec![
            "Dialect".into(),
            "Framework".into(),
            "Extension".into(),
        ]);
        for info in &self.dialects {
            let name = if info.default {
                format!("{} (default)", info.name)
            } else {
                info.name.to_string()
            };
            table = table.row(vec![
                name,
                info.framework.to_string(),
                info.file_extension.to_string(),
            ]);
        }
        table.build().trim_end().to_string()
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

pub fn handle_dialects(default: Dialect) -> DialectList {
    DialectList {
        dialects: Dialect::ALL
            .iter()
            .map(|d| DialectInfo {
                name: d.name(),
                framework: d.framework(),
                file_extension: d.file_extension(),
                default: *d == default,
            })
            .collect(),
    }
}
