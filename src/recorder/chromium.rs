use super::channel::{EventSender, event_channel};
use super::models::ArtifactRef;
use super::target::{ArtifactCapture, RecordingTarget, TargetConnection, TargetHandle};
use crate::config::{BrowserConfig, RecordingConfig};
use crate::js_templates;
use crate::timeouts::{ms, secs};
use crate::utils::resolve_chrome_executable;
use crate::{RecorderError, Result};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::browser_protocol::target::{EventTargetDestroyed, TargetId};
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

/// Records in a dedicated Chrome window driven over CDP.
pub struct ChromiumTarget {
    browser: BrowserConfig,
    recording: RecordingConfig,
}

impl ChromiumTarget {
    pub fn new(browser: BrowserConfig, recording: RecordingConfig) -> Self {
        Self { browser, recording }
    }

    fn launch_config(&self) -> Result<LaunchConfig> {
        let chrome_path = resolve_chrome_executable(self.browser.chrome_path.as_deref())?;

        let mut builder = LaunchConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(self.browser.window_width, self.browser.window_height)
            .request_timeout(Duration::from_secs(secs::REQUEST));

        if !self.browser.headless {
            builder = builder.with_head();
        }

        if let Some(ref dir) = self.browser.user_data_dir {
            builder = builder.user_data_dir(dir);
        }

        builder.build().map_err(RecorderError::LaunchFailed)
    }

    async fn prepare_page(
        &self,
        browser: &Browser,
        url: &Url,
    ) -> Result<(Page, EventStream<EventBindingCalled>)> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RecorderError::TargetUnavailable(format!("Failed to open page: {}", e)))?;

        let binding = self.recording.binding_name.clone();
        page.execute(AddBindingParams::new(binding.clone()))
            .await
            .map_err(|e| RecorderError::TargetUnavailable(format!("Failed to add binding: {}", e)))?;

        let bindings = page
            .event_listener::<EventBindingCalled>()
            .await
            .map_err(|e| {
                RecorderError::TargetUnavailable(format!("Failed to attach binding listener: {}", e))
            })?;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            js_templates::recorder_script(&binding),
        ))
        .await
        .map_err(|e| {
            RecorderError::TargetUnavailable(format!("Failed to inject recorder script: {}", e))
        })?;

        page.goto(url.as_str())
            .await
            .map_err(|e| RecorderError::TargetUnavailable(format!("{}: {}", url, e)))?;

        tokio::time::sleep(Duration::from_millis(ms::PAGE_LOAD_SETTLE)).await;
        Ok((page, bindings))
    }
}

#[async_trait::async_trait]
impl RecordingTarget for ChromiumTarget {
    async fn open(&self, url: &Url) -> Result<TargetConnection> {
        let config = self.launch_config()?;

        let (mut browser, mut handler) =
            tokio::time::timeout(Duration::from_secs(secs::TARGET_OPEN), Browser::launch(config))
                .await
                .map_err(|_| RecorderError::TargetUnavailable("Chrome did not start in time".into()))?
                .map_err(|e| RecorderError::LaunchFailed(e.to_string()))?;

        let (disconnected_tx, disconnected_rx) = oneshot::channel();
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
            let _ = disconnected_tx.send(());
        });

        let prepared = async {
            let destroyed = browser
                .event_listener::<EventTargetDestroyed>()
                .await
                .map_err(|e| RecorderError::TargetUnavailable(e.to_string()))?;
            let (page, bindings) = self.prepare_page(&browser, url).await?;
            let page_target = page.target_id().clone();
            let capture = ScreenshotCapture::new(page, &self.recording)?;
            Ok::<_, RecorderError>((page_target, bindings, destroyed, capture))
        }
        .await;

        let (page_target, bindings, destroyed, capture) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                tokio::time::timeout(Duration::from_secs(secs::BROWSER_CLOSE), browser.close())
                    .await
                    .ok();
                handler_task.abort();
                return Err(e);
            }
        };

        let (tx, rx) = event_channel();
        let forwarder = tokio::spawn(forward_bindings(
            bindings,
            destroyed,
            disconnected_rx,
            page_target,
            self.recording.binding_name.clone(),
            tx,
        ));

        tracing::debug!("Recording target ready at {}", url);
        Ok(TargetConnection {
            handle: Box::new(ChromiumHandle {
                browser,
                forwarder,
                handler: handler_task,
            }),
            events: rx,
            capture: Arc::new(capture),
        })
    }
}

/// Pushes binding payloads into the event channel until the page goes away.
///
/// Returning drops `tx`, which closes the channel.
async fn forward_bindings(
    mut bindings: EventStream<EventBindingCalled>,
    mut destroyed: EventStream<EventTargetDestroyed>,
    mut disconnected: oneshot::Receiver<()>,
    page_target: TargetId,
    binding_name: String,
    tx: EventSender,
) {
    loop {
        tokio::select! {
            event = bindings.next() => {
                let Some(event) = event else { break };
                if event.name != binding_name {
                    continue;
                }
                let message = serde_json::from_str::<Value>(&event.payload)
                    .unwrap_or_else(|_| Value::String(event.payload.clone()));
                if tx.send(message).is_err() {
                    break;
                }
            }
            event = destroyed.next() => match event {
                Some(event) if event.target_id == page_target => {
                    tracing::info!("Recording page was closed");
                    break;
                }
                Some(_) => {}
                None => break,
            },
            _ = &mut disconnected => {
                tracing::info!("Browser disconnected");
                break;
            }
        }
    }
}

pub struct ChromiumHandle {
    browser: Browser,
    forwarder: JoinHandle<()>,
    handler: JoinHandle<()>,
}

#[async_trait::async_trait]
impl TargetHandle for ChromiumHandle {
    async fn close(&mut self) -> Result<()> {
        self.forwarder.abort();

        let closed =
            tokio::time::timeout(Duration::from_secs(secs::BROWSER_CLOSE), self.browser.close())
                .await;
        self.handler.abort();

        match closed {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(RecorderError::General(format!("Failed to close browser: {}", e))),
            Err(_) => Err(RecorderError::General("Timed out closing browser".into())),
        }
    }
}

/// Screenshots of the recording page, one file per accepted step.
pub struct ScreenshotCapture {
    page: Page,
    dir: PathBuf,
    prefix: String,
    format: CaptureScreenshotFormat,
    extension: &'static str,
    quality: Option<i64>,
    counter: AtomicUsize,
}

impl ScreenshotCapture {
    pub fn new(page: Page, config: &RecordingConfig) -> Result<Self> {
        let dir = config.resolved_artifacts_dir();
        std::fs::create_dir_all(&dir)?;

        let (format, extension) = match config.capture_format.to_lowercase().as_str() {
            "png" => (CaptureScreenshotFormat::Png, "png"),
            "webp" => (CaptureScreenshotFormat::Webp, "webp"),
            _ => (CaptureScreenshotFormat::Jpeg, "jpeg"),
        };
        let quality = (extension != "png").then_some(config.capture_quality as i64);

        let id = Uuid::new_v4().simple().to_string();
        Ok(Self {
            page,
            dir,
            prefix: format!("step-{}", &id[..8]),
            format,
            extension,
            quality,
            counter: AtomicUsize::new(0),
        })
    }

    fn next_path(&self) -> PathBuf {
        let index = self.counter.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("{}-{:06}.{}", self.prefix, index, self.extension))
    }
}

#[async_trait::async_trait]
impl ArtifactCapture for ScreenshotCapture {
    async fn capture_artifact(&self) -> Result<ArtifactRef> {
        let mut params = CaptureScreenshotParams::builder()
            .format(self.format.clone())
            .build();
        params.quality = self.quality;

        let screenshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| RecorderError::CaptureFailed(e.to_string()))?;

        let data = BASE64_STANDARD
            .decode(&screenshot.data)
            .map_err(|e| RecorderError::CaptureFailed(format!("Invalid screenshot data: {}", e)))?;

        let path = self.next_path();
        let display = path.display().to_string();
        tokio::task::spawn_blocking(move || std::fs::write(path, data))
            .await
            .map_err(|e| RecorderError::CaptureFailed(format!("{}: {}", display, e)))?
            .map_err(|e| RecorderError::CaptureFailed(format!("{}: {}", display, e)))?;

        Ok(ArtifactRef::captured(display))
    }
}
