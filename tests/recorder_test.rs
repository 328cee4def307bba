//! End-to-end recorder tests against an in-memory recording target.
//!
//! The fake target hands out the sending half of the event channel so tests can
//! play the part of the page: deliver messages, then stop or drop the sender to
//! simulate the window closing.

use serde_json::json;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use testpilot::recorder::{
    AnalysisHook, ArtifactCapture, ArtifactRef, EventSender, RecordingReport, RecordingTarget,
    StopReason, TargetConnection, TargetHandle, event_channel,
};
use testpilot::{Recorder, RecorderError, Result, SessionState, compile};
use tokio::time::timeout;
use url::Url;

struct SequentialCapture {
    count: AtomicUsize,
    delays_ms: Vec<u64>,
}

#[async_trait::async_trait]
impl ArtifactCapture for SequentialCapture {
    async fn capture_artifact(&self) -> Result<ArtifactRef> {
        let n = self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays_ms.get(n) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        Ok(ArtifactRef::captured(format!("mem://shot-{}", n)))
    }
}

struct BrokenCapture;

#[async_trait::async_trait]
impl ArtifactCapture for BrokenCapture {
    async fn capture_artifact(&self) -> Result<ArtifactRef> {
        Err(RecorderError::CaptureFailed("page not painted".into()))
    }
}

struct FakeHandle {
    closes: Arc<AtomicUsize>,
    close_delay: Duration,
}

#[async_trait::async_trait]
impl TargetHandle for FakeHandle {
    async fn close(&mut self) -> Result<()> {
        tokio::time::sleep(self.close_delay).await;
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeTarget {
    sender: StdMutex<Option<EventSender>>,
    opened: StdMutex<Vec<String>>,
    closes: Arc<AtomicUsize>,
    capture: Arc<dyn ArtifactCapture>,
    fail_open: bool,
    close_delay: Duration,
}

impl FakeTarget {
    fn new() -> Arc<Self> {
        Self::with_capture(Arc::new(SequentialCapture {
            count: AtomicUsize::new(0),
            delays_ms: Vec::new(),
        }))
    }

    fn with_capture(capture: Arc<dyn ArtifactCapture>) -> Arc<Self> {
        Arc::new(Self::build(capture, false))
    }

    /// A target whose window takes `delay` to shut down.
    fn slow_to_close(delay: Duration) -> Arc<Self> {
        let mut target = Self::build(
            Arc::new(SequentialCapture {
                count: AtomicUsize::new(0),
                delays_ms: Vec::new(),
            }),
            false,
        );
        target.close_delay = delay;
        Arc::new(target)
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self::build(Arc::new(BrokenCapture), true))
    }

    fn build(capture: Arc<dyn ArtifactCapture>, fail_open: bool) -> Self {
        Self {
            sender: StdMutex::new(None),
            opened: StdMutex::new(Vec::new()),
            closes: Arc::new(AtomicUsize::new(0)),
            capture,
            fail_open,
            close_delay: Duration::ZERO,
        }
    }

    fn send(&self, message: serde_json::Value) {
        let guard = self.sender.lock().unwrap();
        guard.as_ref().expect("target not open").send(message).unwrap();
    }

    /// Drops the page's end of the channel, like the user closing the window.
    fn close_window(&self) {
        self.sender.lock().unwrap().take();
    }
}

#[async_trait::async_trait]
impl RecordingTarget for FakeTarget {
    async fn open(&self, url: &Url) -> Result<TargetConnection> {
        if self.fail_open {
            return Err(RecorderError::TargetUnavailable("popup blocked".into()));
        }
        let (tx, rx) = event_channel();
        *self.sender.lock().unwrap() = Some(tx);
        self.opened.lock().unwrap().push(url.to_string());
        Ok(TargetConnection {
            handle: Box::new(FakeHandle {
                closes: self.closes.clone(),
                close_delay: self.close_delay,
            }),
            events: rx,
            capture: self.capture.clone(),
        })
    }
}

#[derive(Default)]
struct CountingHook {
    calls: AtomicUsize,
    last_len: AtomicUsize,
}

impl AnalysisHook for CountingHook {
    fn on_recording_stopped(&self, report: &RecordingReport) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_len.store(report.steps.len(), Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_record_and_compile_scenario() {
    let target = FakeTarget::new();
    let mut recorder = Recorder::new(target.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    assert_eq!(recorder.state(), SessionState::Recording);

    target.send(json!({"action": "button", "timestamp": 100}));
    target.send(json!({"foo": 1}));
    target.send(json!({"action": "link", "timestamp": 250}));

    let report = recorder.stop_recording().await.unwrap().unwrap();
    assert_eq!(report.stop_reason, StopReason::Requested);
    assert_eq!(recorder.state(), SessionState::Stopped);
    assert_eq!(target.closes.load(Ordering::SeqCst), 1);

    let steps = recorder.get_steps().await.unwrap();
    let summary: Vec<(&str, u64)> = steps
        .iter()
        .map(|s| (s.action.as_str(), s.timestamp))
        .collect();
    assert_eq!(summary, vec![("button", 100), ("link", 250)]);

    let script = recorder.compile("javascript").await.unwrap();
    let text = &script.source_text;
    let visit = text.find("cy.visit('https://example.com')").unwrap();
    let button = text.find("cy.get('button').click()").unwrap();
    let link = text.find("cy.get('link').click()").unwrap();
    assert!(visit < button && button < link);
}

#[tokio::test]
async fn test_empty_url_rejected_without_session() {
    let target = FakeTarget::new();
    let mut recorder = Recorder::new(target.clone());

    let err = recorder.start_recording("").await.unwrap_err();
    assert!(matches!(err, RecorderError::InvalidTarget(_)));
    assert_eq!(recorder.state(), SessionState::Idle);
    assert!(target.opened.lock().unwrap().is_empty());
    assert!(matches!(
        recorder.get_steps().await,
        Err(RecorderError::NoRecording)
    ));
}

#[tokio::test]
async fn test_unreachable_target_leaves_recorder_idle() {
    let mut recorder = Recorder::new(FakeTarget::unreachable());

    let err = recorder
        .start_recording("https://example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, RecorderError::TargetUnavailable(_)));
    assert_eq!(recorder.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_repeated_stop_is_noop() {
    let hook = Arc::new(CountingHook::default());
    let mut recorder = Recorder::new(FakeTarget::new()).with_hook(hook.clone());

    assert!(recorder.stop_recording().await.unwrap().is_none());

    recorder.start_recording("https://example.com").await.unwrap();
    assert!(recorder.stop_recording().await.unwrap().is_some());
    assert!(recorder.stop_recording().await.unwrap().is_none());

    assert_eq!(recorder.state(), SessionState::Stopped);
    assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_window_closed_externally() {
    let target = FakeTarget::new();
    let hook = Arc::new(CountingHook::default());
    let mut recorder = Recorder::new(target.clone()).with_hook(hook.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    target.send(json!({"action": "button", "timestamp": 100}));
    target.close_window();

    let report = timeout(Duration::from_secs(5), recorder.wait_for_target_close())
        .await
        .expect("target close not observed")
        .unwrap()
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::TargetClosed);
    assert_eq!(report.steps.len(), 1);
    assert_eq!(recorder.state(), SessionState::Stopped);
    assert_eq!(hook.last_len.load(Ordering::SeqCst), 1);
    assert!(recorder.compile("playwright").await.is_ok());
}

#[tokio::test]
async fn test_closed_target_reaped_on_next_control_call() {
    let target = FakeTarget::new();
    let mut recorder = Recorder::new(target.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    target.send(json!({"action": "a", "timestamp": 5}));
    target.close_window();

    timeout(Duration::from_secs(5), async {
        while !recorder.session().unwrap().is_target_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pump did not finish");

    let steps = recorder.get_steps().await.unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(recorder.state(), SessionState::Stopped);

    // A new recording is allowed once the previous one has stopped.
    recorder.start_recording("https://example.org").await.unwrap();
    assert_eq!(recorder.state(), SessionState::Recording);
    recorder.stop_recording().await.unwrap();
}

#[tokio::test]
async fn test_state_reports_stopped_once_window_closed() {
    let target = FakeTarget::new();
    let hook = Arc::new(CountingHook::default());
    let mut recorder = Recorder::new(target.clone()).with_hook(hook.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    target.close_window();

    timeout(Duration::from_secs(5), async {
        while !recorder.session().unwrap().is_target_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pump did not finish");

    assert_eq!(recorder.state(), SessionState::Stopped);
    assert_eq!(hook.calls.load(Ordering::SeqCst), 0);

    let report = recorder.stop_recording().await.unwrap().unwrap();
    assert_eq!(report.stop_reason, StopReason::TargetClosed);
    assert_eq!(recorder.state(), SessionState::Stopped);
    assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_interrupted_stop_resumes_on_next_call() {
    let target = FakeTarget::slow_to_close(Duration::from_millis(500));
    let hook = Arc::new(CountingHook::default());
    let mut recorder = Recorder::new(target.clone()).with_hook(hook.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    target.send(json!({"action": "button", "timestamp": 100}));

    let interrupted = timeout(Duration::from_millis(50), recorder.stop_recording()).await;
    assert!(interrupted.is_err());
    assert_eq!(target.closes.load(Ordering::SeqCst), 0);

    let report = recorder.stop_recording().await.unwrap().unwrap();
    assert_eq!(report.stop_reason, StopReason::Requested);
    assert_eq!(report.steps.len(), 1);
    assert_eq!(recorder.state(), SessionState::Stopped);
    assert_eq!(target.closes.load(Ordering::SeqCst), 1);
    assert_eq!(hook.calls.load(Ordering::SeqCst), 1);

    assert!(recorder.stop_recording().await.unwrap().is_none());
    assert!(recorder.compile("javascript").await.is_ok());
    recorder.start_recording("https://example.org").await.unwrap();
    recorder.stop_recording().await.unwrap();
}

#[tokio::test]
async fn test_target_closed_wait_does_not_finalize() {
    let target = FakeTarget::new();
    let mut recorder = Recorder::new(target.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    target.send(json!({"action": "a", "timestamp": 1}));

    let early = timeout(Duration::from_millis(20), recorder.target_closed()).await;
    assert!(early.is_err());
    assert!(recorder.report().is_none());

    target.close_window();
    timeout(Duration::from_secs(5), recorder.target_closed())
        .await
        .expect("target close not observed");
    assert!(recorder.report().is_none());

    let report = recorder.stop_recording().await.unwrap().unwrap();
    assert_eq!(report.stop_reason, StopReason::TargetClosed);
    assert_eq!(report.steps.len(), 1);
}

#[tokio::test]
async fn test_slow_capture_keeps_delivery_order() {
    let capture = Arc::new(SequentialCapture {
        count: AtomicUsize::new(0),
        delays_ms: vec![40, 0, 10],
    });
    let target = FakeTarget::with_capture(capture);
    let mut recorder = Recorder::new(target.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    for (i, action) in ["first", "second", "third"].iter().enumerate() {
        target.send(json!({"action": action, "timestamp": 100 + i as u64}));
    }

    let report = recorder.stop_recording().await.unwrap().unwrap();
    let actions: Vec<&str> = report.steps.iter().map(|s| s.action.as_str()).collect();
    assert_eq!(actions, vec!["first", "second", "third"]);
    assert_eq!(
        report.steps[0].artifact,
        ArtifactRef::captured("mem://shot-0")
    );
}

#[tokio::test]
async fn test_capture_failure_records_sentinel() {
    let target = FakeTarget::with_capture(Arc::new(BrokenCapture));
    let mut recorder = Recorder::new(target.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    target.send(json!({"action": "button", "timestamp": 1}));

    let report = recorder.stop_recording().await.unwrap().unwrap();
    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].artifact, ArtifactRef::Unavailable);
    assert_eq!(report.captured_artifacts(), 0);
}

#[tokio::test]
async fn test_timestamps_non_decreasing() {
    let target = FakeTarget::new();
    let mut recorder = Recorder::new(target.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    for ts in [300u64, 200, 400, 400] {
        target.send(json!({"action": "button", "timestamp": ts}));
    }

    let report = recorder.stop_recording().await.unwrap().unwrap();
    let stamps: Vec<u64> = report.steps.iter().map(|s| s.timestamp).collect();
    assert_eq!(stamps, vec![300, 300, 400, 400]);
}

#[tokio::test]
async fn test_time_travel_cursor() {
    let target = FakeTarget::new();
    let mut recorder = Recorder::new(target.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    target.send(json!({"action": "button", "timestamp": 100}));
    target.send(json!({"action": "link", "timestamp": 250}));
    recorder.stop_recording().await.unwrap();

    let step = recorder.set_cursor(1).await.unwrap();
    assert_eq!(step.action, "link");

    let err = recorder.set_cursor(2).await.unwrap_err();
    assert!(matches!(err, RecorderError::IndexOutOfRange { index: 2, len: 2 }));

    let (index, current) = recorder.current_step().await.unwrap();
    assert_eq!(index, 1);
    assert_eq!(current.action, "link");
}

#[tokio::test]
async fn test_compile_is_pure() {
    let target = FakeTarget::new();
    let mut recorder = Recorder::new(target.clone());

    recorder.start_recording("https://example.com").await.unwrap();
    target.send(json!({
        "action": "button",
        "timestamp": 100,
        "target": {"testid": "save", "aria": ["button", "Save"]}
    }));
    recorder.stop_recording().await.unwrap();

    let before = recorder.get_steps().await.unwrap();
    let a = recorder.compile("playwright").await.unwrap();
    let b = recorder.compile("playwright").await.unwrap();
    assert_eq!(a, b);
    assert!(a.source_text.contains("await page.getByTestId('save').click();"));

    assert!(matches!(
        recorder.compile("cobol").await,
        Err(RecorderError::UnsupportedDialect(_))
    ));
    assert_eq!(recorder.get_steps().await.unwrap(), before);
}

#[test]
fn test_compile_empty_steps_every_dialect() {
    for dialect in ["javascript", "typescript", "playwright"] {
        let script = compile(&[], "https://example.com", dialect).unwrap();
        assert!(script.source_text.contains("https://example.com"));
        assert!(!script.source_text.contains("click()"));
    }
}
