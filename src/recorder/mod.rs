pub mod analysis;
pub mod channel;
pub mod chromium;
pub mod controller;
pub mod models;
pub mod session;
pub mod step_store;
pub mod target;

pub use analysis::{AnalysisHook, LoggingAnalysisHook};
pub use channel::{
    EventChannelAdapter, EventReceiver, EventSender, event_channel, is_action_identifier,
};
pub use chromium::{ChromiumTarget, ScreenshotCapture};
pub use controller::Recorder;
pub use models::{
    ArtifactRef, RecordedStep, RecordingReport, SessionState, StepSequence, StopReason,
    TargetInfo,
};
pub use session::{RecordingSession, parse_target_url};
pub use step_store::StepStore;
pub use target::{ArtifactCapture, RecordingTarget, TargetConnection, TargetHandle};
