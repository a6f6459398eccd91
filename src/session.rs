//! Camera session management
//!
//! A [`Session`] is the one active association between a lifecycle owner,
//! the rear camera, a preview output and a capture output. [`SessionManager`]
//! owns it along with the last capture-output handle it created.

use crate::config::StillshotConfig;
use crate::errors::CameraError;
use crate::outputs::{ImageCapture, Preview, PreviewSurface};
use crate::types::{CameraFormat, CameraSelector, LifecycleOwner};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Binds camera outputs to a lifecycle scope.
pub trait CameraProvider: Send {
    /// Attach `preview` and `capture` to the camera chosen by `selector`,
    /// streaming as close to `format` as the device allows, for as long as
    /// `owner` is active.
    fn bind_to_lifecycle(
        &mut self,
        owner: &LifecycleOwner,
        selector: CameraSelector,
        format: &CameraFormat,
        preview: &Preview,
        capture: &ImageCapture,
    ) -> Result<(), CameraError>;

    /// Release every binding this provider holds.
    fn unbind_all(&mut self);

    /// Number of bindings currently held.
    fn bound_count(&self) -> usize;
}

pub type ProviderResult = Result<Box<dyn CameraProvider>, CameraError>;

/// Build a provider off the async runtime and resolve once it is ready.
pub fn request_provider<F>(factory: F) -> oneshot::Receiver<ProviderResult>
where
    F: FnOnce() -> ProviderResult + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        let _ = tx.send(factory());
    });
    rx
}

/// What a binding is built from. A change forces a rebind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub format: CameraFormat,
    pub jpeg_quality: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            format: CameraFormat::standard(),
            jpeg_quality: 95,
        }
    }
}

impl From<&StillshotConfig> for SessionConfig {
    fn from(config: &StillshotConfig) -> Self {
        Self {
            format: config.camera.format(),
            jpeg_quality: config.storage.jpeg_quality,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    owner: LifecycleOwner,
    selector: CameraSelector,
    preview: Preview,
    capture: ImageCapture,
    config: SessionConfig,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &LifecycleOwner {
        &self.owner
    }

    pub fn selector(&self) -> CameraSelector {
        self.selector
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn capture_output(&self) -> &ImageCapture {
        &self.capture
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// The capture screen only ever binds the rear camera.
const SESSION_SELECTOR: CameraSelector = CameraSelector::Back;

pub struct SessionManager {
    provider: Option<Box<dyn CameraProvider>>,
    surface: PreviewSurface,
    config: SessionConfig,
    session: Option<Session>,
    capture_output: Option<ImageCapture>,
}

impl SessionManager {
    pub fn new(config: SessionConfig, surface: PreviewSurface) -> Self {
        Self {
            provider: None,
            surface,
            config,
            session: None,
            capture_output: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Takes effect on the next [`ensure_bound`](Self::ensure_bound).
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    pub fn is_provider_ready(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Bindings the provider reports as active.
    pub fn active_bindings(&self) -> usize {
        self.provider.as_ref().map_or(0, |p| p.bound_count())
    }

    /// The most recently created capture output, even if its binding failed
    /// or has since been released.
    pub fn current_capture_output(&self) -> Option<ImageCapture> {
        self.capture_output.clone()
    }

    pub fn on_provider_ready(
        &mut self,
        provider: Box<dyn CameraProvider>,
        owner: &LifecycleOwner,
    ) -> Result<&Session, CameraError> {
        if let Some(mut previous) = self.provider.replace(provider) {
            previous.unbind_all();
        }
        self.session = None;
        self.bind(owner)
    }

    /// Build fresh outputs and bind them, clearing any existing binding first.
    pub fn bind(&mut self, owner: &LifecycleOwner) -> Result<&Session, CameraError> {
        let provider = self.provider.as_mut().ok_or_else(|| {
            CameraError::InitializationError("camera provider is not ready".to_string())
        })?;

        let preview = Preview::new(&self.surface);
        let capture = ImageCapture::new(self.config.jpeg_quality);
        self.capture_output = Some(capture.clone());

        self.session = None;
        provider.unbind_all();

        if let Err(e) = provider.bind_to_lifecycle(
            owner,
            SESSION_SELECTOR,
            &self.config.format,
            &preview,
            &capture,
        ) {
            log::error!("Use case binding failed for {}: {}", owner, e);
            return Err(e);
        }

        let session = Session {
            id: Uuid::new_v4(),
            owner: owner.clone(),
            selector: SESSION_SELECTOR,
            preview,
            capture,
            config: self.config.clone(),
        };
        log::info!(
            "Bound {} camera to {} (session {})",
            session.selector,
            owner,
            session.id
        );
        Ok(self.session.insert(session))
    }

    /// Keep the current session when owner and configuration are unchanged,
    /// otherwise rebind.
    pub fn ensure_bound(&mut self, owner: &LifecycleOwner) -> Result<&Session, CameraError> {
        let reusable = self
            .session
            .as_ref()
            .is_some_and(|s| &s.owner == owner && s.config == self.config);

        if reusable {
            log::debug!("Session already bound to {}, keeping it", owner);
            return self.session.as_ref().ok_or(CameraError::NotBound);
        }
        self.bind(owner)
    }

    pub fn on_activate(&mut self, owner: &LifecycleOwner) -> Result<&Session, CameraError> {
        if !self.is_provider_ready() {
            log::debug!("Activation before camera provider is ready, nothing to bind");
            return Err(CameraError::InitializationError(
                "camera provider is not ready".to_string(),
            ));
        }
        self.ensure_bound(owner)
    }

    /// Release the active binding. The last capture output stays reachable
    /// but is detached.
    pub fn on_deactivate(&mut self) {
        if let Some(provider) = self.provider.as_mut() {
            provider.unbind_all();
        }
        if let Some(session) = self.session.take() {
            log::info!("Released camera session {}", session.id);
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.on_deactivate();
    }
}
