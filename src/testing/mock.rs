//! In-memory camera provider and permission requester.

use crate::errors::CameraError;
use crate::outputs::{ImageCapture, Preview, StillSource};
use crate::permissions::PermissionRequester;
use crate::session::CameraProvider;
use crate::testing::synthetic_data::{synthetic_video_frame, SyntheticSource};
use crate::types::{CameraFormat, CameraSelector, LifecycleOwner};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

#[derive(Debug, Default)]
pub struct MockProviderState {
    pub bind_calls: u32,
    pub unbind_calls: u32,
    pub fail_next_binds: u32,
    pub fail_captures: bool,
    pub last_owner: Option<LifecycleOwner>,
    pub last_selector: Option<CameraSelector>,
    pub last_format: Option<CameraFormat>,
    bound: Vec<ImageCapture>,
}

/// Provider that binds synthetic sources. Clones share state, so a test can
/// keep one clone for inspection and hand another to the session manager.
#[derive(Debug, Clone)]
pub struct MockProvider {
    state: Arc<Mutex<MockProviderState>>,
    frame_size: (u32, u32),
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            frame_size: (32, 24),
        }
    }

    pub fn boxed(&self) -> Box<dyn CameraProvider> {
        Box::new(self.clone())
    }

    pub fn state(&self) -> MutexGuard<'_, MockProviderState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next `count` binds fail.
    pub fn fail_binds(&self, count: u32) {
        self.state().fail_next_binds = count;
    }

    /// Sources attached from now on fail every capture.
    pub fn fail_captures(&self, fail: bool) {
        self.state().fail_captures = fail;
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraProvider for MockProvider {
    fn bind_to_lifecycle(
        &mut self,
        owner: &LifecycleOwner,
        selector: CameraSelector,
        format: &CameraFormat,
        preview: &Preview,
        capture: &ImageCapture,
    ) -> Result<(), CameraError> {
        let (width, height) = self.frame_size;
        let mut state = self.state();
        state.bind_calls += 1;
        state.last_owner = Some(owner.clone());
        state.last_selector = Some(selector);
        state.last_format = Some(format.clone());

        if state.fail_next_binds > 0 {
            state.fail_next_binds -= 1;
            return Err(CameraError::BindError("mock camera refused binding".to_string()));
        }

        let source = if state.fail_captures {
            SyntheticSource::failing(width, height)
        } else {
            SyntheticSource::new(width, height)
        };
        capture.attach(Arc::new(source) as Arc<dyn StillSource>);
        preview.submit(synthetic_video_frame(0, width, height));
        state.bound.push(capture.clone());
        Ok(())
    }

    fn unbind_all(&mut self) {
        let mut state = self.state();
        state.unbind_calls += 1;
        for capture in state.bound.drain(..) {
            capture.detach();
        }
    }

    fn bound_count(&self) -> usize {
        self.state().bound.len()
    }
}

/// Resolves every permission request with a fixed answer.
#[derive(Debug, Clone)]
pub struct MockPermissionRequester {
    pub granted: bool,
}

impl MockPermissionRequester {
    pub fn granting() -> Self {
        Self { granted: true }
    }

    pub fn denying() -> Self {
        Self { granted: false }
    }
}

impl PermissionRequester for MockPermissionRequester {
    fn request(&self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(self.granted);
        rx
    }
}
