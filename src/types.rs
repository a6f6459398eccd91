//! Plain data shared by the session, capture and screen layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which physical camera a session binds to.
///
/// Sessions always bind [`CameraSelector::Back`]; the front selector only
/// exists so backends can map both ends of a device list. It is not
/// configurable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSelector {
    #[default]
    Back,
    Front,
}

impl CameraSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraSelector::Back => "back",
            CameraSelector::Front => "front",
        }
    }
}

impl std::fmt::Display for CameraSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested stream format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
}

impl CameraFormat {
    pub fn new(width: u32, height: u32, fps: f32) -> Self {
        Self { width, height, fps }
    }

    /// 1280x720 at 30fps
    pub fn standard() -> Self {
        Self::new(1280, 720, 30.0)
    }

    /// Delay between preview frames for this format's frame rate.
    pub fn frame_interval(&self) -> std::time::Duration {
        if self.fps <= 0.0 {
            return std::time::Duration::from_millis(33);
        }
        std::time::Duration::from_secs_f32(1.0 / self.fps)
    }
}

impl Default for CameraFormat {
    fn default() -> Self {
        Self::standard()
    }
}

/// A single decoded frame, RGB8 unless `format` says otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraFrame {
    pub id: String,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub size_bytes: usize,
}

impl CameraFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        let size_bytes = data.len();
        Self {
            id: Uuid::new_v4().to_string(),
            data,
            width,
            height,
            format: "RGB8".to_string(),
            timestamp: Utc::now(),
            device_id,
            size_bytes,
        }
    }

    /// True when the buffer holds exactly `width * height` RGB8 pixels.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize) * (self.height as usize) * 3
    }
}

/// The scope that decides when camera resources are active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifecycleOwner {
    pub id: String,
    pub name: String,
}

impl LifecycleOwner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for LifecycleOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
