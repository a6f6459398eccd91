//! Camera outputs: the preview stream and the still-capture handle.
//!
//! Both are cheap cloneable handles. A provider wires them to hardware when it
//! binds a session and detaches them again on unbind.

use crate::errors::CameraError;
use crate::types::CameraFrame;
use image::codecs::jpeg::JpegEncoder;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

/// Anything that can hand out a single still frame on demand.
pub trait StillSource: Send + Sync {
    fn capture_still(&self) -> Result<CameraFrame, CameraError>;
}

/// The rendering surface the preview region draws from. Latest frame wins.
#[derive(Debug, Clone)]
pub struct PreviewSurface {
    frames: Arc<watch::Sender<Option<CameraFrame>>>,
}

impl PreviewSurface {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            frames: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CameraFrame>> {
        self.frames.subscribe()
    }

    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.frames.borrow().clone()
    }

    fn present(&self, frame: CameraFrame) {
        self.frames.send_replace(Some(frame));
    }
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Preview output for one binding, attached to the screen's surface.
#[derive(Debug, Clone)]
pub struct Preview {
    id: Uuid,
    surface: PreviewSurface,
}

impl Preview {
    pub fn new(surface: &PreviewSurface) -> Self {
        Self {
            id: Uuid::new_v4(),
            surface: surface.clone(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Push a frame to the surface. Called from the backend's preview thread.
    pub fn submit(&self, frame: CameraFrame) {
        self.surface.present(frame);
    }
}

/// Destination of a single still capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFileOptions {
    pub path: PathBuf,
}

impl OutputFileOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct ImageCaptureInner {
    id: Uuid,
    jpeg_quality: u8,
    source: Mutex<Option<Arc<dyn StillSource>>>,
}

/// Capture-output handle. Captures only succeed while a provider has a
/// [`StillSource`] attached; a handle left over from a failed or released
/// binding reports [`CameraError::NotBound`].
#[derive(Clone)]
pub struct ImageCapture {
    inner: Arc<ImageCaptureInner>,
}

impl std::fmt::Debug for ImageCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCapture")
            .field("id", &self.inner.id)
            .field("jpeg_quality", &self.inner.jpeg_quality)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ImageCapture {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            inner: Arc::new(ImageCaptureInner {
                id: Uuid::new_v4(),
                jpeg_quality: jpeg_quality.clamp(1, 100),
                source: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.inner.jpeg_quality
    }

    pub fn attach(&self, source: Arc<dyn StillSource>) {
        let mut guard = self.inner.source.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(source);
    }

    pub fn detach(&self) {
        let mut guard = self.inner.source.lock().unwrap_or_else(|e| e.into_inner());
        guard.take();
    }

    pub fn is_attached(&self) -> bool {
        self.inner
            .source
            .lock()
            .map(|g| g.is_some())
            .unwrap_or(false)
    }

    /// Capture one still and write it as JPEG to `options.path`.
    ///
    /// The returned receiver resolves exactly once. Must be called from
    /// within a Tokio runtime.
    pub fn take_picture(
        &self,
        options: OutputFileOptions,
    ) -> oneshot::Receiver<Result<PathBuf, CameraError>> {
        let (tx, rx) = oneshot::channel();
        let source = self
            .inner
            .source
            .lock()
            .ok()
            .and_then(|g| g.clone());
        let quality = self.inner.jpeg_quality;

        tokio::task::spawn_blocking(move || {
            let result = match source {
                Some(source) => write_still(source.as_ref(), &options.path, quality)
                    .map(|()| options.path),
                None => Err(CameraError::NotBound),
            };
            let _ = tx.send(result);
        });

        rx
    }
}

fn write_still(source: &dyn StillSource, path: &Path, quality: u8) -> Result<(), CameraError> {
    let frame = source.capture_still()?;
    let (width, height) = (frame.width, frame.height);

    let img = image::RgbImage::from_vec(width, height, frame.data).ok_or_else(|| {
        CameraError::EncodingError(format!(
            "frame buffer does not hold {}x{} RGB8 pixels",
            width, height
        ))
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    image::DynamicImage::ImageRgb8(img).write_with_encoder(encoder)?;
    writer.flush()?;

    let file = writer
        .into_inner()
        .map_err(|e| CameraError::IoError(e.to_string()))?;
    file.sync_all()?;
    Ok(())
}
