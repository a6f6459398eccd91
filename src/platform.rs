//! Hardware camera provider backed by nokhwa.
//!
//! The back selector maps to the first device the OS reports and the front
//! selector to the second. Each binding opens its own stream at the format
//! closest to the requested one; a preview thread feeds the preview output
//! until the binding is released.

use crate::errors::CameraError;
use crate::outputs::{ImageCapture, Preview, StillSource};
use crate::session::CameraProvider;
use crate::types::{CameraFormat, CameraFrame, CameraSelector, LifecycleOwner};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
    CallbackCamera,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Still source reading from an open nokhwa stream.
pub struct NokhwaStill {
    camera: Arc<Mutex<CallbackCamera>>,
    device_id: String,
}

impl StillSource for NokhwaStill {
    fn capture_still(&self) -> Result<CameraFrame, CameraError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::CaptureError("Failed to lock camera".to_string()))?;

        let buffer = camera
            .poll_frame()
            .map_err(|e| CameraError::CaptureError(format!("Failed to capture frame: {}", e)))?;

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureError(format!("Failed to decode frame: {}", e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        Ok(CameraFrame::new(decoded.into_raw(), width, height, self.device_id.clone()))
    }
}

struct ActiveBinding {
    owner: LifecycleOwner,
    capture: ImageCapture,
    camera: Arc<Mutex<CallbackCamera>>,
    stop: Arc<AtomicBool>,
    preview_thread: Option<JoinHandle<()>>,
}

impl ActiveBinding {
    fn release(mut self) {
        self.capture.detach();
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.preview_thread.take() {
            if thread.join().is_err() {
                log::warn!("Preview thread for {} panicked", self.owner);
            }
        }

        match self.camera.lock() {
            Ok(mut camera) => {
                if let Err(e) = camera.stop_stream() {
                    log::warn!("Failed to stop camera stream: {}", e);
                }
            }
            Err(_) => log::warn!("Camera lock poisoned while releasing {}", self.owner),
        };
        log::debug!("Released camera binding for {}", self.owner);
    }
}

pub struct NokhwaProvider {
    device_count: usize,
    bindings: Vec<ActiveBinding>,
}

impl NokhwaProvider {
    /// Enumerate devices. Blocking; run it through
    /// [`request_provider`](crate::session::request_provider).
    pub fn initialize() -> Result<Self, CameraError> {
        let devices = query(ApiBackend::Auto).map_err(|e| {
            CameraError::InitializationError(format!("Failed to query cameras: {}", e))
        })?;

        if devices.is_empty() {
            return Err(CameraError::InitializationError(
                "No cameras found".to_string(),
            ));
        }

        log::info!("Camera provider ready with {} device(s)", devices.len());
        for device in &devices {
            log::debug!("Camera {}: {}", device.index(), device.human_name());
        }

        Ok(Self {
            device_count: devices.len(),
            bindings: Vec::new(),
        })
    }

    fn device_index(&self, selector: CameraSelector) -> Result<u32, CameraError> {
        let index = match selector {
            CameraSelector::Back => 0,
            CameraSelector::Front => 1,
        };
        if index >= self.device_count {
            return Err(CameraError::BindError(format!(
                "no {} camera available ({} device(s))",
                selector, self.device_count
            )));
        }
        Ok(index as u32)
    }
}

impl CameraProvider for NokhwaProvider {
    fn bind_to_lifecycle(
        &mut self,
        owner: &LifecycleOwner,
        selector: CameraSelector,
        format: &CameraFormat,
        preview: &Preview,
        capture: &ImageCapture,
    ) -> Result<(), CameraError> {
        let index = self.device_index(selector)?;
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            nokhwa::utils::CameraFormat::new(
                Resolution::new(format.width, format.height),
                FrameFormat::MJPEG,
                format.fps.round().max(1.0) as u32,
            ),
        ));

        let mut camera = CallbackCamera::new(CameraIndex::Index(index), requested, |_| {})
            .map_err(|e| {
                CameraError::BindError(format!("Failed to open camera {}: {}", index, e))
            })?;
        camera
            .open_stream()
            .map_err(|e| CameraError::BindError(format!("Failed to start stream: {}", e)))?;

        let camera = Arc::new(Mutex::new(camera));
        let source = Arc::new(NokhwaStill {
            camera: camera.clone(),
            device_id: index.to_string(),
        });

        let stop = Arc::new(AtomicBool::new(false));
        let preview_thread = {
            let source = source.clone();
            let stop = stop.clone();
            let preview = preview.clone();
            let interval = format.frame_interval();
            std::thread::Builder::new()
                .name("stillshot-preview".to_string())
                .spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        match source.capture_still() {
                            Ok(frame) => preview.submit(frame),
                            Err(e) => log::debug!("Preview frame dropped: {}", e),
                        }
                        std::thread::sleep(interval);
                    }
                })
                .map_err(|e| CameraError::BindError(format!("Failed to start preview: {}", e)))?
        };
        capture.attach(source);

        log::info!(
            "Camera {} bound to {} at {}x{}@{}",
            index,
            owner,
            format.width,
            format.height,
            format.fps
        );
        self.bindings.push(ActiveBinding {
            owner: owner.clone(),
            capture: capture.clone(),
            camera,
            stop,
            preview_thread: Some(preview_thread),
        });
        Ok(())
    }

    fn unbind_all(&mut self) {
        for binding in self.bindings.drain(..) {
            binding.release();
        }
    }

    fn bound_count(&self) -> usize {
        self.bindings.len()
    }
}

impl Drop for NokhwaProvider {
    fn drop(&mut self) {
        self.unbind_all();
    }
}
