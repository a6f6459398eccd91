//! The capture screen
//!
//! [`CameraScreen`] owns every piece of mutable state and changes it only in
//! [`CameraScreen::handle_event`]. Permission answers, provider readiness and
//! capture outcomes are produced on other tasks and arrive here as
//! [`ScreenEvent`]s, so the event loop is the single context that touches the
//! session or the display state.

use crate::capture::{CaptureController, CaptureOutcome};
use crate::config::StillshotConfig;
use crate::errors::CameraError;
use crate::outputs::PreviewSurface;
use crate::permissions::{PermissionGate, PermissionRequester};
use crate::session::{ProviderResult, SessionConfig, SessionManager};
use crate::types::{CameraFrame, LifecycleOwner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Binding opens devices and unbinding joins preview threads. On a
/// multi-thread runtime the worker is handed off while that happens.
fn provider_call<T>(f: impl FnOnce() -> T) -> T {
    let multi_thread = Handle::try_current()
        .is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread);
    if multi_thread {
        tokio::task::block_in_place(f)
    } else {
        f()
    }
}

pub const TRIGGER_LABEL: &str = "Take Photo";

pub fn status_line(saved: &Path) -> String {
    format!("Photo saved to: {}", saved.display())
}

pub enum ScreenEvent {
    PermissionResult(bool),
    ProviderReady(ProviderResult),
    Activated,
    Deactivated,
    Trigger,
    CaptureFinished {
        path: PathBuf,
        outcome: CaptureOutcome,
    },
    Teardown,
}

impl std::fmt::Debug for ScreenEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenEvent::PermissionResult(granted) => {
                f.debug_tuple("PermissionResult").field(granted).finish()
            }
            ScreenEvent::ProviderReady(result) => f
                .debug_tuple("ProviderReady")
                .field(&result.as_ref().map(|_| "provider"))
                .finish(),
            ScreenEvent::Activated => f.write_str("Activated"),
            ScreenEvent::Deactivated => f.write_str("Deactivated"),
            ScreenEvent::Trigger => f.write_str("Trigger"),
            ScreenEvent::CaptureFinished { path, outcome } => f
                .debug_struct("CaptureFinished")
                .field("path", path)
                .field("outcome", outcome)
                .finish(),
            ScreenEvent::Teardown => f.write_str("Teardown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenState {
    Unbound,
    Binding,
    Bound,
    Capturing,
}

impl std::fmt::Display for ScreenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenState::Unbound => write!(f, "unbound"),
            ScreenState::Binding => write!(f, "binding"),
            ScreenState::Bound => write!(f, "bound"),
            ScreenState::Capturing => write!(f, "capturing"),
        }
    }
}

/// The last successfully stored photo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    last_saved: Option<PathBuf>,
}

impl DisplayState {
    pub fn last_saved(&self) -> Option<&Path> {
        self.last_saved.as_deref()
    }
}

/// What the layout renders: preview region on top, trigger, optional status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenView {
    pub state: ScreenState,
    pub preview_visible: bool,
    pub trigger_label: String,
    pub status_line: Option<String>,
    pub permission_granted: Option<bool>,
    pub captures_finished: u64,
}

pub struct CameraScreen {
    owner: LifecycleOwner,
    state: ScreenState,
    mounted: bool,
    pending_captures: usize,
    captures_finished: u64,
    permissions: PermissionGate,
    sessions: SessionManager,
    controller: CaptureController,
    display: DisplayState,
    surface: PreviewSurface,
    events: mpsc::UnboundedSender<ScreenEvent>,
    view_tx: watch::Sender<ScreenView>,
}

impl CameraScreen {
    pub fn new(config: &StillshotConfig) -> (Self, mpsc::UnboundedReceiver<ScreenEvent>) {
        Self::with_parts(
            SessionConfig::from(config),
            CaptureController::new(config.storage.media_dir()),
        )
    }

    pub fn with_parts(
        session_config: SessionConfig,
        controller: CaptureController,
    ) -> (Self, mpsc::UnboundedReceiver<ScreenEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let surface = PreviewSurface::new();
        let initial = ScreenView {
            state: ScreenState::Unbound,
            preview_visible: false,
            trigger_label: TRIGGER_LABEL.to_string(),
            status_line: None,
            permission_granted: None,
            captures_finished: 0,
        };
        let (view_tx, _) = watch::channel(initial);

        let screen = Self {
            owner: LifecycleOwner::new("camera-capture-screen"),
            state: ScreenState::Unbound,
            mounted: false,
            pending_captures: 0,
            captures_finished: 0,
            permissions: PermissionGate::new(),
            sessions: SessionManager::new(session_config, surface.clone()),
            controller,
            display: DisplayState::default(),
            surface,
            events,
            view_tx,
        };
        (screen, rx)
    }

    pub fn owner(&self) -> &LifecycleOwner {
        &self.owner
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn permissions(&self) -> &PermissionGate {
        &self.permissions
    }

    pub fn events(&self) -> mpsc::UnboundedSender<ScreenEvent> {
        self.events.clone()
    }

    pub fn handle(&self) -> ScreenHandle {
        ScreenHandle {
            events: self.events.clone(),
            view: self.view_tx.subscribe(),
            surface: self.surface.clone(),
        }
    }

    /// First display: request permission and wait for the camera provider,
    /// both without blocking.
    pub fn mount(
        &mut self,
        requester: &dyn PermissionRequester,
        provider: oneshot::Receiver<ProviderResult>,
    ) {
        if self.mounted {
            log::debug!("Screen already mounted");
            return;
        }
        self.mounted = true;
        log::info!("Mounting capture screen {}", self.owner);

        self.permissions.launch(requester, self.events.clone());

        let events = self.events.clone();
        tokio::spawn(async move {
            let ready = provider.await.unwrap_or_else(|_| {
                Err(CameraError::InitializationError(
                    "camera provider request dropped".to_string(),
                ))
            });
            let _ = events.send(ScreenEvent::ProviderReady(ready));
        });

        self.publish();
    }

    /// Apply one event. Returns false once the screen is torn down.
    pub fn handle_event(&mut self, event: ScreenEvent) -> bool {
        log::trace!("Screen event: {:?}", event);
        let keep_running = match event {
            ScreenEvent::PermissionResult(granted) => {
                self.permissions.record(granted);
                true
            }
            ScreenEvent::ProviderReady(Ok(provider)) => {
                self.state = ScreenState::Binding;
                provider_call(|| {
                    let _ = self.sessions.on_provider_ready(provider, &self.owner);
                });
                self.settle();
                true
            }
            ScreenEvent::ProviderReady(Err(e)) => {
                log::error!("Camera provider unavailable: {}", e);
                true
            }
            ScreenEvent::Activated => {
                if self.sessions.is_provider_ready() {
                    self.state = ScreenState::Binding;
                    provider_call(|| {
                        let _ = self.sessions.on_activate(&self.owner);
                    });
                    self.settle();
                } else {
                    log::debug!("Screen activated before camera provider is ready");
                }
                true
            }
            ScreenEvent::Deactivated => {
                provider_call(|| self.sessions.on_deactivate());
                self.settle();
                true
            }
            ScreenEvent::Trigger => {
                self.trigger();
                true
            }
            ScreenEvent::CaptureFinished { path, outcome } => {
                self.finish_capture(path, outcome);
                true
            }
            ScreenEvent::Teardown => {
                provider_call(|| self.sessions.on_deactivate());
                self.mounted = false;
                self.settle();
                log::info!("Capture screen {} torn down", self.owner);
                false
            }
        };
        self.publish();
        keep_running
    }

    /// Drive the screen until [`ScreenEvent::Teardown`].
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ScreenEvent>) -> Self {
        while let Some(event) = rx.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        self
    }

    pub fn view(&self) -> ScreenView {
        ScreenView {
            state: self.state,
            preview_visible: self.mounted,
            trigger_label: TRIGGER_LABEL.to_string(),
            status_line: self.display.last_saved().map(status_line),
            permission_granted: self.permissions.granted(),
            captures_finished: self.captures_finished,
        }
    }

    fn trigger(&mut self) {
        let Some(request) = self.controller.trigger(self.sessions.current_capture_output()) else {
            return;
        };

        self.pending_captures += 1;
        self.state = ScreenState::Capturing;

        let events = self.events.clone();
        tokio::spawn(async move {
            let path = request.path().to_path_buf();
            let outcome = request.outcome().await;
            let _ = events.send(ScreenEvent::CaptureFinished { path, outcome });
        });
    }

    fn finish_capture(&mut self, path: PathBuf, outcome: CaptureOutcome) {
        match outcome {
            CaptureOutcome::Saved(saved) => {
                log::info!("Photo capture succeeded: {}", saved.display());
                self.display.last_saved = Some(saved);
            }
            CaptureOutcome::Failed(message) => {
                log::error!("Photo capture failed: {} ({})", message, path.display());
            }
        }
        self.pending_captures = self.pending_captures.saturating_sub(1);
        self.captures_finished += 1;
        self.settle();
    }

    fn settle(&mut self) {
        self.state = if self.pending_captures > 0 {
            ScreenState::Capturing
        } else if self.sessions.is_bound() {
            ScreenState::Bound
        } else {
            ScreenState::Unbound
        };
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}

/// Cloneable remote control for a running screen.
#[derive(Debug, Clone)]
pub struct ScreenHandle {
    events: mpsc::UnboundedSender<ScreenEvent>,
    view: watch::Receiver<ScreenView>,
    surface: PreviewSurface,
}

impl ScreenHandle {
    fn send(&self, event: ScreenEvent) -> Result<(), CameraError> {
        self.events.send(event).map_err(|_| {
            CameraError::InitializationError("camera screen is not running".to_string())
        })
    }

    pub fn trigger(&self) -> Result<(), CameraError> {
        self.send(ScreenEvent::Trigger)
    }

    pub fn set_active(&self, active: bool) -> Result<(), CameraError> {
        self.send(if active {
            ScreenEvent::Activated
        } else {
            ScreenEvent::Deactivated
        })
    }

    pub fn teardown(&self) -> Result<(), CameraError> {
        self.send(ScreenEvent::Teardown)
    }

    pub fn is_running(&self) -> bool {
        !self.events.is_closed()
    }

    pub fn view(&self) -> ScreenView {
        self.view.borrow().clone()
    }

    pub fn preview_frame(&self) -> Option<CameraFrame> {
        self.surface.latest_frame()
    }

    /// Wait until the published view satisfies `predicate`.
    pub async fn wait_for<F>(
        &self,
        timeout: Duration,
        predicate: F,
    ) -> Result<ScreenView, CameraError>
    where
        F: FnMut(&ScreenView) -> bool,
    {
        let mut view = self.view.clone();
        let waited = tokio::time::timeout(timeout, view.wait_for(predicate))
            .await
            .map(|matched| matched.map(|v| (*v).clone()));
        match waited {
            Ok(Ok(matched)) => Ok(matched),
            Ok(Err(_)) => Err(CameraError::InitializationError(
                "camera screen stopped".to_string(),
            )),
            Err(_) => Err(CameraError::InitializationError(format!(
                "timed out after {}ms waiting for screen",
                timeout.as_millis()
            ))),
        }
    }
}

/// Build, mount and run a screen on the current Tokio runtime.
pub fn spawn_screen(
    config: &StillshotConfig,
    requester: &dyn PermissionRequester,
    provider: oneshot::Receiver<ProviderResult>,
) -> (ScreenHandle, JoinHandle<CameraScreen>) {
    let (mut screen, rx) = CameraScreen::new(config);
    screen.mount(requester, provider);
    let handle = screen.handle();
    let join = tokio::spawn(screen.run(rx));
    (handle, join)
}
