//! Configuration for the capture screen
//!
//! Camera and storage defaults, optionally overridden from a TOML file. The
//! screen itself never writes configuration back.

use crate::errors::CameraError;
use crate::types::CameraFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StillshotConfig {
    pub camera: CameraConfig,
    pub storage: StorageConfig,
}

/// Camera-specific configuration. The screen always binds the rear camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Requested stream resolution [width, height]
    pub resolution: [u32; 2],
    /// Preview frames per second
    pub fps: u32,
}

/// Where and how captured photos are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Per-app media directory for captured photos
    pub media_directory: String,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for StillshotConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                resolution: [1280, 720],
                fps: 30,
            },
            storage: StorageConfig {
                media_directory: default_media_dir().to_string_lossy().into_owned(),
                jpeg_quality: 95,
            },
        }
    }
}

/// `<pictures>/stillshot`, or `./media` when the platform has no pictures dir.
pub fn default_media_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
        .map(|p| p.join("stillshot"))
        .unwrap_or_else(|| PathBuf::from("./media"))
}

impl CameraConfig {
    pub fn format(&self) -> CameraFormat {
        CameraFormat::new(self.resolution[0], self.resolution[1], self.fps as f32)
    }
}

impl StorageConfig {
    pub fn media_dir(&self) -> PathBuf {
        PathBuf::from(&self.media_directory)
    }
}

impl StillshotConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::InitializationError(format!("Failed to read config file: {}", e))
        })?;

        let config: StillshotConfig = toml::from_str(&contents).map_err(|e| {
            CameraError::InitializationError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CameraError::InitializationError(format!(
                        "Failed to create config directory: {}",
                        e
                    ))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CameraError::InitializationError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CameraError::InitializationError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("stillshot.toml")
    }

    /// Load from default location, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.resolution[0] == 0 || self.camera.resolution[1] == 0 {
            return Err("Invalid resolution".to_string());
        }
        if self.camera.fps == 0 || self.camera.fps > 240 {
            return Err("Invalid FPS (must be 1-240)".to_string());
        }
        if self.storage.media_directory.trim().is_empty() {
            return Err("Media directory must not be empty".to_string());
        }
        if self.storage.jpeg_quality == 0 || self.storage.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }
        Ok(())
    }
}
