use super::channel::{EventChannelAdapter, PumpOutcome};
use super::models::{RecordedStep, RecordingReport, SessionState, StepSequence, StopReason};
use super::step_store::StepStore;
use super::target::{RecordingTarget, TargetConnection, TargetHandle};
use crate::compiler::{self, Dialect, GeneratedScript, ScriptOptions};
use crate::{RecorderError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

/// Validates a recording target address.
pub fn parse_target_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RecorderError::InvalidTarget("target URL is empty".into()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| RecorderError::InvalidTarget(format!("{}: {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        "file" => Ok(url),
        "http" | "https" => Err(RecorderError::InvalidTarget(format!(
            "{}: missing host",
            trimmed
        ))),
        scheme => Err(RecorderError::InvalidTarget(format!(
            "{}: unsupported scheme '{}'",
            trimmed, scheme
        ))),
    }
}

/// Live resources of a `Recording` session.
///
/// Stays in place until `stop` has finished, so a stop that is cancelled at
/// one of its await points resumes where it left off on the next call.
struct LiveTarget {
    handle: Box<dyn TargetHandle>,
    stop_tx: watch::Sender<bool>,
    exited_rx: watch::Receiver<bool>,
    pump: JoinHandle<PumpOutcome>,
    /// Set once the pump has been joined. The inner `None` means it panicked.
    joined: Option<Option<PumpOutcome>>,
    handle_closed: bool,
}

/// One recording attempt: `Idle -> Recording -> Stopped`.
///
/// The session exclusively owns the target handle and the step store. `Stopped`
/// is terminal; recording again needs a fresh session.
pub struct RecordingSession {
    id: Uuid,
    target_url: String,
    url: Url,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    store: Arc<Mutex<StepStore>>,
    live: Option<LiveTarget>,
    report: Option<RecordingReport>,
}

impl RecordingSession {
    pub fn new(target_url: &str) -> Result<Self> {
        let url = parse_target_url(target_url)?;
        Ok(Self {
            id: Uuid::new_v4(),
            target_url: target_url.trim().to_string(),
            url,
            state: SessionState::Idle,
            started_at: None,
            store: Arc::new(Mutex::new(StepStore::new())),
            live: None,
            report: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn report(&self) -> Option<&RecordingReport> {
        self.report.as_ref()
    }

    /// Opens the target and starts accepting events.
    pub async fn start(
        &mut self,
        target: &dyn RecordingTarget,
        capture_timeout: Duration,
    ) -> Result<()> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Recording => return Err(RecorderError::AlreadyRecording),
            SessionState::Stopped => {
                return Err(RecorderError::General(
                    "session already stopped; start a new recording".into(),
                ));
            }
        }

        let TargetConnection {
            handle,
            events,
            capture,
        } = target.open(&self.url).await.map_err(|e| match e {
            RecorderError::TargetUnavailable(_) => e,
            other => RecorderError::TargetUnavailable(other.to_string()),
        })?;

        let store = Arc::new(Mutex::new(StepStore::new()));
        let (stop_tx, stop_rx) = watch::channel(false);
        let (exited_tx, exited_rx) = watch::channel(false);

        let adapter = EventChannelAdapter::new(capture, capture_timeout);
        let pump_store = store.clone();
        let pump = tokio::spawn(async move {
            let outcome = adapter.run(events, pump_store, stop_rx).await;
            let _ = exited_tx.send(true);
            outcome
        });

        self.store = store;
        self.live = Some(LiveTarget {
            handle,
            stop_tx,
            exited_rx,
            pump,
            joined: None,
            handle_closed: false,
        });
        self.started_at = Some(Utc::now());
        self.state = SessionState::Recording;

        tracing::info!("Recording {} started for {}", self.id, self.target_url);
        Ok(())
    }

    /// True once the target has gone away on its own while still `Recording`.
    pub fn is_target_closed(&self) -> bool {
        self.live.as_ref().is_some_and(|live| live.pump.is_finished())
    }

    /// Resolves when the target closes. Returns immediately if not recording.
    pub async fn wait_target_closed(&mut self) {
        if let Some(live) = self.live.as_mut() {
            let _ = live.exited_rx.wait_for(|exited| *exited).await;
        }
    }

    /// Stops recording and seals the steps.
    ///
    /// A no-op returning `None` unless the session is `Recording`. Safe to call
    /// again after the returned future was dropped before completion.
    pub async fn stop(&mut self) -> Result<Option<RecordingReport>> {
        let Some(live) = self.live.as_mut() else {
            tracing::debug!("Stop requested on {} session, nothing to do", self.state);
            return Ok(None);
        };

        let _ = live.stop_tx.send(true);

        if live.joined.is_none() {
            let outcome = match (&mut live.pump).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::warn!("Event pump for {} ended abnormally: {}", self.id, e);
                    None
                }
            };
            live.joined = Some(outcome);
        }

        if !live.handle_closed {
            if let Err(e) = live.handle.close().await {
                tracing::debug!("Closing recording target: {}", e);
            }
            live.handle_closed = true;
        }

        let outcome = live.joined.flatten();

        let steps = {
            let mut store = self.store.lock().await;
            store.seal();
            store.snapshot()
        };

        if let Some(outcome) = outcome {
            tracing::debug!(
                "Session {}: {} steps accepted, {} messages dropped",
                self.id,
                outcome.accepted,
                outcome.dropped
            );
        }

        let ended_at = Utc::now();
        let report = RecordingReport {
            session_id: self.id,
            target_url: self.target_url.clone(),
            started_at: self.started_at.unwrap_or(ended_at),
            ended_at,
            stop_reason: outcome.map_or(StopReason::Requested, |o| o.reason),
            steps,
        };

        self.live = None;
        self.state = SessionState::Stopped;
        self.report = Some(report.clone());

        tracing::info!(
            "Recording {} stopped ({:?}) with {} steps",
            self.id,
            report.stop_reason,
            report.steps.len()
        );
        Ok(Some(report))
    }

    /// Steps recorded so far; the sealed sequence once stopped.
    pub async fn steps(&self) -> StepSequence {
        match &self.report {
            Some(report) => report.steps.clone(),
            None => self.store.lock().await.snapshot(),
        }
    }

    pub async fn set_cursor(&self, index: usize) -> Result<RecordedStep> {
        self.store.lock().await.set_cursor(index).cloned()
    }

    pub async fn current_step(&self) -> Option<(usize, RecordedStep)> {
        let store = self.store.lock().await;
        let index = store.cursor()?;
        store.current().map(|step| (index, step.clone()))
    }

    /// Compiles the sealed steps. Only valid once `Stopped`.
    pub fn compile(&self, dialect: Dialect, options: &ScriptOptions) -> Result<GeneratedScript> {
        match (&self.state, &self.report) {
            (SessionState::Stopped, Some(report)) => Ok(compiler::compile_with(
                &report.steps,
                &self.target_url,
                dialect,
                options,
            )),
            (SessionState::Recording, _) => Err(RecorderError::RecordingInProgress),
            _ => Err(RecorderError::NoRecording),
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            tracing::warn!("Recording {} dropped while still recording", self.id);
            live.pump.abort();
        }
    }
}
