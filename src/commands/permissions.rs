use crate::permissions::{check_permission_detailed, PermissionInfo, PermissionStatus};
use tauri::command;

/// Check camera permission status
#[command]
pub async fn check_camera_permission_status() -> Result<PermissionInfo, String> {
    let info = tokio::task::spawn_blocking(check_permission_detailed)
        .await
        .map_err(|e| format!("Task join error: {}", e))?;
    log::debug!("Camera permission status: {} ({})", info.status, info.message);
    Ok(info)
}

/// Get permission status as a simple string
#[command]
pub async fn get_permission_status_string() -> Result<String, String> {
    let info = check_camera_permission_status().await?;
    Ok(match info.status {
        PermissionStatus::Granted => "granted",
        PermissionStatus::Denied => "denied",
        PermissionStatus::NotDetermined => "not_determined",
        PermissionStatus::Restricted => "restricted",
    }
    .to_string())
}
