use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Recording => write!(f, "recording"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Requested,
    TargetClosed,
}

/// Opaque reference to a visual capture. The capture backend owns the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactRef {
    Captured { uri: String },
    Unavailable,
}

impl ArtifactRef {
    pub fn captured(uri: impl Into<String>) -> Self {
        Self::Captured { uri: uri.into() }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactRef::Captured { uri } => write!(f, "{}", uri),
            ArtifactRef::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Selector hints captured next to the action by the injected recorder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// `[role, accessible name]` when both are known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aria: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TargetInfo {
    pub fn from_aria(aria: Vec<String>) -> Self {
        Self {
            aria,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aria.is_empty() && self.css.is_none() && self.testid.is_none() && self.text.is_none()
    }

    pub fn role_and_name(&self) -> Option<(&str, &str)> {
        match self.aria.as_slice() {
            [role, name, ..] if !role.is_empty() && !name.is_empty() => {
                Some((role.as_str(), name.as_str()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedStep {
    pub action: String,
    pub timestamp: u64,
    pub artifact: ArtifactRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetInfo>,
}

impl RecordedStep {
    pub fn new(action: impl Into<String>, timestamp: u64, artifact: ArtifactRef) -> Self {
        Self {
            action: action.into(),
            timestamp,
            artifact,
            target: None,
        }
    }

    pub fn with_target(mut self, target: TargetInfo) -> Self {
        self.target = (!target.is_empty()).then_some(target);
        self
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(i64::try_from(self.timestamp).ok()?)
    }
}

/// Immutable, cheaply cloneable sequence of recorded steps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepSequence(Arc<[RecordedStep]>);

impl StepSequence {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[RecordedStep] {
        &self.0
    }
}

impl Deref for StepSequence {
    type Target = [RecordedStep];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<RecordedStep>> for StepSequence {
    fn from(steps: Vec<RecordedStep>) -> Self {
        Self(steps.into())
    }
}

impl Serialize for StepSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for StepSequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<RecordedStep>::deserialize(deserializer).map(Self::from)
    }
}

/// Summary of one finished recording, handed to analysis hooks and printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingReport {
    pub session_id: Uuid,
    pub target_url: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub stop_reason: StopReason,
    pub steps: StepSequence,
}

impl RecordingReport {
    pub fn duration_ms(&self) -> u64 {
        (self.ended_at - self.started_at).num_milliseconds().max(0) as u64
    }

    pub fn captured_artifacts(&self) -> usize {
        self.steps.iter().filter(|s| s.artifact.is_available()).count()
    }
}
