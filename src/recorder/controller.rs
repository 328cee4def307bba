use super::analysis::{AnalysisHook, LoggingAnalysisHook};
use super::chromium::ChromiumTarget;
use super::models::{RecordedStep, RecordingReport, SessionState, StepSequence};
use super::session::RecordingSession;
use super::target::RecordingTarget;
use crate::compiler::{Dialect, GeneratedScript, ScriptOptions};
use crate::config::Config;
use crate::timeouts::ms;
use crate::{RecorderError, Result};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Control surface over a single recording session at a time.
pub struct Recorder {
    target: Arc<dyn RecordingTarget>,
    hook: Arc<dyn AnalysisHook>,
    capture_timeout: Duration,
    script_options: ScriptOptions,
    session: Option<RecordingSession>,
}

impl Recorder {
    pub fn new(target: Arc<dyn RecordingTarget>) -> Self {
        Self {
            target,
            hook: Arc::new(LoggingAnalysisHook),
            capture_timeout: Duration::from_millis(ms::CAPTURE),
            script_options: ScriptOptions::default(),
            session: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let target = ChromiumTarget::new(config.browser.clone(), config.recording.clone());
        Self::new(Arc::new(target))
            .with_capture_timeout(Duration::from_millis(config.recording.capture_timeout_ms))
            .with_script_options(config.output.script_options())
    }

    pub fn with_hook(mut self, hook: Arc<dyn AnalysisHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    pub fn with_script_options(mut self, options: ScriptOptions) -> Self {
        self.script_options = options;
        self
    }

    /// Opens `url` and begins recording. Rejected while another recording runs.
    pub async fn start_recording(&mut self, url: &str) -> Result<Uuid> {
        self.reap_closed_target().await?;

        if self.state() == SessionState::Recording {
            return Err(RecorderError::AlreadyRecording);
        }

        let mut session = RecordingSession::new(url)?;
        session
            .start(self.target.as_ref(), self.capture_timeout)
            .await?;

        let id = session.id();
        self.session = Some(session);
        Ok(id)
    }

    /// Stops the active recording. `None` when nothing was recording.
    pub async fn stop_recording(&mut self) -> Result<Option<RecordingReport>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        let report = session.stop().await?;
        if let Some(ref report) = report {
            self.hook.on_recording_stopped(report);
        }
        Ok(report)
    }

    /// A session whose target has already gone away reports `Stopped`, even
    /// before the next control call finalizes it.
    pub fn state(&self) -> SessionState {
        match self.session.as_ref() {
            None => SessionState::Idle,
            Some(session) if session.is_target_closed() => SessionState::Stopped,
            Some(session) => session.state(),
        }
    }

    pub async fn get_steps(&mut self) -> Result<StepSequence> {
        self.reap_closed_target().await?;
        match self.session.as_ref() {
            Some(session) => Ok(session.steps().await),
            None => Err(RecorderError::NoRecording),
        }
    }

    /// Compiles the last finished recording into `dialect`.
    pub async fn compile(&mut self, dialect: &str) -> Result<GeneratedScript> {
        let dialect: Dialect = dialect.parse()?;
        self.reap_closed_target().await?;
        match self.session.as_ref() {
            Some(session) => session.compile(dialect, &self.script_options),
            None => Err(RecorderError::NoRecording),
        }
    }

    pub async fn set_cursor(&mut self, index: usize) -> Result<RecordedStep> {
        self.reap_closed_target().await?;
        match self.session.as_ref() {
            Some(session) => session.set_cursor(index).await,
            None => Err(RecorderError::NoRecording),
        }
    }

    pub async fn current_step(&self) -> Option<(usize, RecordedStep)> {
        self.session.as_ref()?.current_step().await
    }

    /// Resolves once the target closes on its own. Cancel-safe; does not
    /// finalize the session.
    pub async fn target_closed(&mut self) {
        match self.session.as_mut() {
            Some(session) if session.state() == SessionState::Recording => {
                session.wait_target_closed().await;
            }
            _ => std::future::pending().await,
        }
    }

    /// Waits until the target closes on its own, then finalizes the session.
    pub async fn wait_for_target_close(&mut self) -> Result<Option<RecordingReport>> {
        if self.state() == SessionState::Idle || self.report().is_some() {
            return Ok(None);
        }
        self.target_closed().await;
        self.stop_recording().await
    }

    /// Report of the last finished recording.
    pub fn report(&self) -> Option<&RecordingReport> {
        self.session.as_ref()?.report()
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Finalizes a session whose target went away between control calls.
    async fn reap_closed_target(&mut self) -> Result<()> {
        let closed = self
            .session
            .as_ref()
            .is_some_and(RecordingSession::is_target_closed);

        if closed {
            tracing::info!("Recording target closed externally");
            self.stop_recording().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::channel::{EventSender, event_channel};
    use crate::recorder::models::ArtifactRef;
    use crate::recorder::target::{ArtifactCapture, TargetConnection, TargetHandle};
    use std::sync::Mutex as StdMutex;
    use url::Url;

    struct StubCapture;

    #[async_trait::async_trait]
    impl ArtifactCapture for StubCapture {
        async fn capture_artifact(&self) -> Result<ArtifactRef> {
            Ok(ArtifactRef::captured("mem://shot"))
        }
    }

    struct StubHandle;

    #[async_trait::async_trait]
    impl TargetHandle for StubHandle {
        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubTarget {
        senders: StdMutex<Vec<EventSender>>,
    }

    #[async_trait::async_trait]
    impl RecordingTarget for StubTarget {
        async fn open(&self, _url: &Url) -> Result<TargetConnection> {
            let (tx, rx) = event_channel();
            self.senders.lock().unwrap().push(tx);
            Ok(TargetConnection {
                handle: Box::new(StubHandle),
                events: rx,
                capture: Arc::new(StubCapture),
            })
        }
    }

    #[tokio::test]
    async fn test_controls_without_session() {
        let mut recorder = Recorder::new(Arc::new(StubTarget::default()));

        assert_eq!(recorder.state(), SessionState::Idle);
        assert!(recorder.stop_recording().await.unwrap().is_none());
        assert!(matches!(
            recorder.get_steps().await,
            Err(RecorderError::NoRecording)
        ));
        assert!(matches!(
            recorder.compile("javascript").await,
            Err(RecorderError::NoRecording)
        ));
        assert!(recorder.current_step().await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_start_rejected() {
        let target = Arc::new(StubTarget::default());
        let mut recorder = Recorder::new(target.clone());

        let first = recorder.start_recording("https://example.com").await.unwrap();
        let err = recorder
            .start_recording("https://example.org")
            .await
            .unwrap_err();

        assert!(matches!(err, RecorderError::AlreadyRecording));
        assert_eq!(recorder.session().unwrap().id(), first);
        assert_eq!(target.senders.lock().unwrap().len(), 1);

        recorder.stop_recording().await.unwrap();
    }

    #[tokio::test]
    async fn test_compile_rejected_while_recording() {
        let mut recorder = Recorder::new(Arc::new(StubTarget::default()));
        recorder.start_recording("https://example.com").await.unwrap();

        assert!(matches!(
            recorder.compile("playwright").await,
            Err(RecorderError::RecordingInProgress)
        ));
        assert!(matches!(
            recorder.compile("cobol").await,
            Err(RecorderError::UnsupportedDialect(_))
        ));

        recorder.stop_recording().await.unwrap();
        assert!(recorder.compile("playwright").await.is_ok());
    }
}
