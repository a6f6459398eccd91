use crate::config::StillshotConfig;
use crate::permissions::{PermissionRequester, SystemPermissionRequester};
use crate::platform::NokhwaProvider;
use crate::screen::{spawn_screen, ScreenHandle, ScreenView};
use crate::session::{request_provider, CameraProvider, ProviderResult};
use crate::types::CameraFrame;
use std::sync::Arc;
use tauri::command;
use tokio::sync::{oneshot, RwLock};

// The one capture screen this plugin drives
lazy_static::lazy_static! {
    static ref ACTIVE_SCREEN: Arc<RwLock<Option<ScreenHandle>>> = Arc::new(RwLock::new(None));
}

/// Mount the capture screen against the system camera
#[command]
pub async fn start_camera_screen(media_dir: Option<String>) -> Result<ScreenView, String> {
    let mut config = StillshotConfig::load_or_default();
    if let Some(dir) = media_dir {
        config.storage.media_directory = dir;
    }
    config.validate()?;

    let provider = request_provider(|| {
        NokhwaProvider::initialize().map(|p| Box::new(p) as Box<dyn CameraProvider>)
    });

    start_camera_screen_with(&config, &SystemPermissionRequester, provider).await
}

/// Mount the capture screen with explicit collaborators, replacing any
/// screen that is already running.
pub async fn start_camera_screen_with(
    config: &StillshotConfig,
    requester: &dyn PermissionRequester,
    provider: oneshot::Receiver<ProviderResult>,
) -> Result<ScreenView, String> {
    log::info!(
        "Starting capture screen, media directory: {}",
        config.storage.media_directory
    );

    let mut active = ACTIVE_SCREEN.write().await;
    if let Some(previous) = active.take() {
        log::debug!("Replacing running capture screen");
        let _ = previous.teardown();
    }

    let (handle, _join) = spawn_screen(config, requester, provider);
    let view = handle.view();
    *active = Some(handle);
    Ok(view)
}

async fn active_handle() -> Result<ScreenHandle, String> {
    ACTIVE_SCREEN
        .read()
        .await
        .clone()
        .filter(ScreenHandle::is_running)
        .ok_or_else(|| "Capture screen is not running".to_string())
}

/// Press the capture trigger
#[command]
pub async fn take_photo() -> Result<ScreenView, String> {
    let handle = active_handle().await?;
    handle.trigger().map_err(|e| e.to_string())?;
    Ok(handle.view())
}

/// Current projection of the screen
#[command]
pub async fn get_screen_view() -> Result<ScreenView, String> {
    Ok(active_handle().await?.view())
}

/// Forward a lifecycle change from the host window
#[command]
pub async fn set_screen_active(active: bool) -> Result<ScreenView, String> {
    let handle = active_handle().await?;
    handle.set_active(active).map_err(|e| e.to_string())?;
    Ok(handle.view())
}

/// Latest frame shown in the preview region
#[command]
pub async fn get_preview_frame() -> Result<Option<CameraFrame>, String> {
    Ok(active_handle().await?.preview_frame())
}

/// Tear the screen down and release the camera
#[command]
pub async fn stop_camera_screen() -> Result<(), String> {
    let mut active = ACTIVE_SCREEN.write().await;
    match active.take() {
        Some(handle) => {
            log::info!("Stopping capture screen");
            handle.teardown().map_err(|e| e.to_string())
        }
        None => Err("Capture screen is not running".to_string()),
    }
}
