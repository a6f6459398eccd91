//! Still capture controller
//!
//! Names the destination file for each trigger and issues exactly one
//! capture against the current capture output.

use crate::errors::CameraError;
use crate::outputs::{ImageCapture, OutputFileOptions};
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;

/// `yyyy-MM-dd-HH-mm-ss-SSS`; chrono formatting is locale independent.
pub const PHOTO_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

pub const PHOTO_EXTENSION: &str = "jpg";

/// File name for a photo taken at `at`. Two captures in the same millisecond
/// get the same name and the later write replaces the earlier file.
pub fn photo_file_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}.{}", at.format(PHOTO_TIMESTAMP_FORMAT), PHOTO_EXTENSION)
}

pub fn photo_path<Tz>(media_dir: &Path, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    media_dir.join(photo_file_name(at))
}

/// Terminal result of one capture request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOutcome {
    Saved(PathBuf),
    Failed(String),
}

impl CaptureOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, CaptureOutcome::Saved(_))
    }
}

/// A pending capture. Consuming [`outcome`](Self::outcome) yields its single
/// terminal result.
#[derive(Debug)]
pub struct CaptureRequest {
    path: PathBuf,
    result: oneshot::Receiver<Result<PathBuf, CameraError>>,
}

impl CaptureRequest {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn outcome(self) -> CaptureOutcome {
        match self.result.await {
            Ok(Ok(saved)) => CaptureOutcome::Saved(saved),
            Ok(Err(e)) => CaptureOutcome::Failed(e.to_string()),
            Err(_) => CaptureOutcome::Failed(
                "capture task ended without reporting an outcome".to_string(),
            ),
        }
    }
}

pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

pub struct CaptureController {
    media_dir: PathBuf,
    clock: Clock,
}

impl CaptureController {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(media_dir, Arc::new(Local::now))
    }

    pub fn with_clock(media_dir: impl Into<PathBuf>, clock: Clock) -> Self {
        Self {
            media_dir: media_dir.into(),
            clock,
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Issue one capture. With no capture output yet this is a no-op.
    ///
    /// Overlapping triggers are not guarded; each one issues its own request.
    pub fn trigger(&self, capture: Option<ImageCapture>) -> Option<CaptureRequest> {
        let Some(capture) = capture else {
            log::debug!("Capture trigger ignored: no capture output yet");
            return None;
        };

        let path = photo_path(&self.media_dir, &(self.clock)());
        log::info!("Taking photo to {}", path.display());

        let result = capture.take_picture(OutputFileOptions::new(path.clone()));
        Some(CaptureRequest { path, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(ms: u32) -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_milli_opt(9, 5, 2, ms)
            .unwrap();
        Local.from_local_datetime(&naive).single().unwrap()
    }

    #[test]
    fn test_file_name_pattern() {
        assert_eq!(photo_file_name(&at(45)), "2024-03-07-09-05-02-045.jpg");
    }

    #[test]
    fn test_path_joins_media_dir() {
        let path = photo_path(Path::new("/media/app"), &at(999));
        assert_eq!(path, PathBuf::from("/media/app/2024-03-07-09-05-02-999.jpg"));
    }

    #[test]
    fn test_trigger_without_output_is_noop() {
        let controller = CaptureController::new("/unused");
        assert!(controller.trigger(None).is_none());
    }

    #[tokio::test]
    async fn test_trigger_uses_clock_for_path() {
        let dir = tempfile::tempdir().unwrap();
        let controller = CaptureController::with_clock(dir.path(), Arc::new(|| at(1)));
        let request = controller.trigger(Some(ImageCapture::new(80))).unwrap();
        assert_eq!(request.path(), dir.path().join("2024-03-07-09-05-02-001.jpg"));

        // Nothing attached, so the single outcome is a failure.
        let outcome = request.outcome().await;
        assert_eq!(
            outcome,
            CaptureOutcome::Failed("Not bound to a valid camera".to_string())
        );
    }
}
