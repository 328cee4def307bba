//! Event channel adapter.
//!
//! The recording target runs in its own execution context and reports user
//! actions as loosely shaped JSON messages. Everything arriving here is treated
//! as untrusted: messages are validated against the `{action, timestamp}`
//! contract, malformed ones are logged and dropped, and valid ones are turned
//! into [`RecordedStep`]s by a single writer that owns all appends to the
//! session's [`StepStore`].

use super::models::{ArtifactRef, RecordedStep, StopReason, TargetInfo};
use super::step_store::StepStore;
use super::target::ArtifactCapture;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};

pub type RawMessage = Value;
pub type EventSender = mpsc::UnboundedSender<RawMessage>;
pub type EventReceiver = mpsc::UnboundedReceiver<RawMessage>;

/// Unbounded so that delivery never blocks the recording target.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

const MAX_HINT_LEN: usize = 512;
// Largest integer an f64 (and a JS number) represents exactly.
const MAX_TIMESTAMP: f64 = 9_007_199_254_740_991.0;

static ACTION_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.:-]{0,63}$").expect("valid action regex"));

/// True when `action` is a semantic identifier the recorder would accept.
pub fn is_action_identifier(action: &str) -> bool {
    ACTION_IDENT.is_match(action)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotAnObject,
    MissingAction,
    InvalidAction,
    MissingTimestamp,
    InvalidTimestamp,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NotAnObject => write!(f, "message is not an object"),
            Rejection::MissingAction => write!(f, "missing 'action'"),
            Rejection::InvalidAction => write!(f, "'action' is not a semantic identifier"),
            Rejection::MissingTimestamp => write!(f, "missing 'timestamp'"),
            Rejection::InvalidTimestamp => {
                write!(f, "'timestamp' is not a finite non-negative number")
            }
        }
    }
}

/// A validated message, not yet paired with an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCandidate {
    pub action: String,
    pub timestamp: u64,
    pub target: Option<TargetInfo>,
}

impl StepCandidate {
    pub fn into_step(self, artifact: ArtifactRef) -> RecordedStep {
        let step = RecordedStep::new(self.action, self.timestamp, artifact);
        match self.target {
            Some(target) => step.with_target(target),
            None => step,
        }
    }
}

/// Validates one raw channel message. Unknown fields are ignored.
pub fn normalize(raw: &RawMessage) -> Result<StepCandidate, Rejection> {
    let obj = raw.as_object().ok_or(Rejection::NotAnObject)?;

    let action = match obj.get("action") {
        None | Some(Value::Null) => return Err(Rejection::MissingAction),
        Some(Value::String(s)) if ACTION_IDENT.is_match(s) => s.clone(),
        Some(_) => return Err(Rejection::InvalidAction),
    };

    let timestamp = match obj.get("timestamp") {
        None | Some(Value::Null) => return Err(Rejection::MissingTimestamp),
        Some(value) => parse_timestamp(value)?,
    };

    let target = obj
        .get("target")
        .and_then(Value::as_object)
        .and_then(parse_target);

    Ok(StepCandidate {
        action,
        timestamp,
        target,
    })
}

fn parse_timestamp(value: &Value) -> Result<u64, Rejection> {
    let ms = value.as_f64().ok_or(Rejection::InvalidTimestamp)?;
    if !ms.is_finite() || !(0.0..=MAX_TIMESTAMP).contains(&ms) {
        return Err(Rejection::InvalidTimestamp);
    }
    Ok(ms.trunc() as u64)
}

// Hints are best effort: a bad hint is discarded, never the message.
fn parse_target(obj: &Map<String, Value>) -> Option<TargetInfo> {
    let hint = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= MAX_HINT_LEN)
            .map(String::from)
    };

    let aria = obj
        .get("aria")
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .take(2)
                .map(|v| v.as_str().map(str::trim).map(String::from))
                .collect::<Option<Vec<_>>>()
        })
        .filter(|pair| pair.len() == 2 && pair.iter().all(|s| s.len() <= MAX_HINT_LEN))
        .unwrap_or_default();

    let target = TargetInfo {
        aria,
        css: hint("css"),
        testid: hint("testid"),
        text: hint("text"),
    };

    (!target.is_empty()).then_some(target)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpOutcome {
    pub reason: StopReason,
    pub accepted: usize,
    pub dropped: usize,
}

pub struct EventChannelAdapter {
    capture: Arc<dyn ArtifactCapture>,
    capture_timeout: Duration,
    accepted: usize,
    dropped: usize,
}

impl EventChannelAdapter {
    pub fn new(capture: Arc<dyn ArtifactCapture>, capture_timeout: Duration) -> Self {
        Self {
            capture,
            capture_timeout,
            accepted: 0,
            dropped: 0,
        }
    }

    /// Validates `raw` and, if it is well formed, captures an artifact for it.
    pub async fn accept(&self, raw: &RawMessage) -> Option<RecordedStep> {
        match normalize(raw) {
            Ok(candidate) => {
                let artifact = self.capture().await;
                Some(candidate.into_step(artifact))
            }
            Err(rejection) => {
                tracing::debug!("Dropping channel message ({}): {}", rejection, raw);
                None
            }
        }
    }

    async fn capture(&self) -> ArtifactRef {
        match tokio::time::timeout(self.capture_timeout, self.capture.capture_artifact()).await {
            Ok(Ok(artifact)) => artifact,
            Ok(Err(e)) => {
                tracing::warn!("{}; recording step without artifact", e);
                ArtifactRef::Unavailable
            }
            Err(_) => {
                tracing::warn!(
                    "Artifact capture timed out after {}ms; recording step without artifact",
                    self.capture_timeout.as_millis()
                );
                ArtifactRef::Unavailable
            }
        }
    }

    /// Single writer loop. Each capture is awaited before the append, so steps
    /// land in the store in channel delivery order.
    ///
    /// Returns once a stop is signalled (after draining what was already
    /// delivered) or once the target drops its end of the channel. The store is
    /// sealed on exit either way.
    pub async fn run(
        mut self,
        mut events: EventReceiver,
        store: Arc<Mutex<StepStore>>,
        mut stop: watch::Receiver<bool>,
    ) -> PumpOutcome {
        let reason = loop {
            tokio::select! {
                biased;
                _ = stop.changed() => {
                    events.close();
                    while let Some(raw) = events.recv().await {
                        self.ingest(&raw, &store).await;
                    }
                    break StopReason::Requested;
                }
                message = events.recv() => match message {
                    Some(raw) => self.ingest(&raw, &store).await,
                    None => {
                        tracing::debug!("Event channel closed by recording target");
                        break StopReason::TargetClosed;
                    }
                },
            }
        };

        store.lock().await.seal();

        PumpOutcome {
            reason,
            accepted: self.accepted,
            dropped: self.dropped,
        }
    }

    async fn ingest(&mut self, raw: &RawMessage, store: &Mutex<StepStore>) {
        let Some(step) = self.accept(raw).await else {
            self.dropped += 1;
            return;
        };

        match store.lock().await.append(step) {
            Ok(index) => {
                self.accepted += 1;
                tracing::trace!("Recorded step #{}", index + 1);
            }
            Err(e) => tracing::debug!("Discarding step: {}", e),
        }
    }
}
