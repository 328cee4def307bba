use super::channel::EventReceiver;
use super::models::ArtifactRef;
use crate::Result;
use std::sync::Arc;
use url::Url;

/// Browser-control backend that can open a page to record.
#[async_trait::async_trait]
pub trait RecordingTarget: Send + Sync {
    /// Opens `url` and wires its event channel. Fails with `TargetUnavailable`.
    async fn open(&self, url: &Url) -> Result<TargetConnection>;
}

/// Ownership of an opened recording target.
#[async_trait::async_trait]
pub trait TargetHandle: Send {
    async fn close(&mut self) -> Result<()>;
}

#[async_trait::async_trait]
pub trait ArtifactCapture: Send + Sync {
    /// Fails with `CaptureFailed`.
    async fn capture_artifact(&self) -> Result<ArtifactRef>;
}

/// Everything a session needs from an opened target.
///
/// The sending half of `events` lives with the target; when the target goes away
/// the channel closes, which is how external closure is observed.
pub struct TargetConnection {
    pub handle: Box<dyn TargetHandle>,
    pub events: EventReceiver,
    pub capture: Arc<dyn ArtifactCapture>,
}

