//! Stillshot: a live camera preview and still photo capture screen for Tauri
//! applications
//!
//! One screen, one camera. On mount it asks for camera access, binds a
//! preview output and a still-capture output to the rear camera once the
//! camera provider is ready, and writes a timestamped JPEG each time the
//! trigger is pressed.
//!
//! # Usage
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(stillshot::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Without Tauri, drive a [`screen::CameraScreen`] directly:
//! ```rust,ignore
//! let config = stillshot::StillshotConfig::load_or_default();
//! let provider = stillshot::session::request_provider(|| {
//!     stillshot::platform::NokhwaProvider::initialize()
//!         .map(|p| Box::new(p) as Box<dyn stillshot::CameraProvider>)
//! });
//! let (handle, _screen) = stillshot::screen::spawn_screen(
//!     &config,
//!     &stillshot::permissions::SystemPermissionRequester,
//!     provider,
//! );
//! handle.trigger()?;
//! ```
pub mod capture;
pub mod commands;
pub mod config;
pub mod errors;
pub mod outputs;
pub mod permissions;
pub mod platform;
pub mod screen;
pub mod session;
pub mod types;

// Mock collaborators and synthetic frames for offline testing
pub mod testing;

pub use capture::{CaptureController, CaptureOutcome, CaptureRequest};
pub use config::StillshotConfig;
pub use errors::CameraError;
pub use outputs::{ImageCapture, Preview, PreviewSurface, StillSource};
pub use screen::{CameraScreen, ScreenEvent, ScreenHandle, ScreenState, ScreenView};
pub use session::{CameraProvider, Session, SessionConfig, SessionManager};
pub use types::{CameraFormat, CameraFrame, CameraSelector, LifecycleOwner};

use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the stillshot plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("stillshot")
        .invoke_handler(tauri::generate_handler![
            commands::screen::start_camera_screen,
            commands::screen::take_photo,
            commands::screen::get_screen_view,
            commands::screen::set_screen_active,
            commands::screen::get_preview_frame,
            commands::screen::stop_camera_screen,
            commands::permissions::check_camera_permission_status,
            commands::permissions::get_permission_status_string,
        ])
        .build()
}

/// Initialize logging, defaulting to `stillshot=info`
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "stillshot=info");
    }
    let _ = env_logger::try_init();
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
