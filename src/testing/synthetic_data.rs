//! Synthetic frames for offline testing
//!
//! Gradient frames that change per sequence number, enough for the JPEG
//! encoder and the preview surface to see real pixel data without hardware.

use crate::errors::CameraError;
use crate::outputs::StillSource;
use crate::types::CameraFrame;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Create an RGB8 gradient frame whose colours shift with `frame_number`.
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> CameraFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];

    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    CameraFrame::new(data, width, height, "synthetic".to_string())
}

/// A [`StillSource`] that serves synthetic frames, optionally failing.
#[derive(Debug)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    captured: AtomicU64,
    failing: AtomicBool,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            captured: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn failing(width: u32, height: u32) -> Self {
        let source = Self::new(width, height);
        source.set_failing(true);
        source
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn captured(&self) -> u64 {
        self.captured.load(Ordering::SeqCst)
    }
}

impl StillSource for SyntheticSource {
    fn capture_still(&self) -> Result<CameraFrame, CameraError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CameraError::CaptureError(
                "synthetic sensor failure".to_string(),
            ));
        }
        let sequence = self.captured.fetch_add(1, Ordering::SeqCst);
        Ok(synthetic_video_frame(sequence, self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_frame_shape() {
        let frame = synthetic_video_frame(3, 8, 4);
        assert!(frame.is_valid());
        assert_eq!(frame.data[0], 3);
        assert_ne!(
            synthetic_video_frame(0, 8, 4).data,
            synthetic_video_frame(1, 8, 4).data
        );
    }

    #[test]
    fn test_failing_source() {
        let source = SyntheticSource::failing(4, 4);
        assert!(source.capture_still().is_err());
        source.set_failing(false);
        assert!(source.capture_still().is_ok());
        assert_eq!(source.captured(), 1);
    }
}
