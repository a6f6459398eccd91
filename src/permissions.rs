use crate::screen::ScreenEvent;
use tokio::sync::{mpsc, oneshot};

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted by system policy
    Restricted,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

/// Check camera permission status for the current platform
pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(target_os = "linux"))]
    {
        check_permission_by_enumeration()
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::fs;
    use std::path::Path;

    let video_devices: Vec<_> = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .filter(|path| Path::new(path).exists())
        .collect();

    let Some(first_device) = video_devices.first() else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No video devices found at /dev/video*".to_string(),
            can_request: false,
        };
    };

    match fs::metadata(first_device) {
        Ok(_) if check_linux_group_membership() => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!(
                "Camera access granted (user in video group, {} found)",
                first_device
            ),
            can_request: false,
        },
        Ok(_) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!(
                "Camera device {} exists but user not in video group - run: sudo usermod -a -G video $USER",
                first_device
            ),
            can_request: true,
        },
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Cannot access {}: {}", first_device, e),
            can_request: true,
        },
    }
}

#[cfg(target_os = "linux")]
fn check_linux_group_membership() -> bool {
    use std::process::Command;

    Command::new("groups")
        .output()
        .ok()
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|groups| groups.contains("video") || groups.contains("plugdev"))
        .unwrap_or(false)
}

// Device enumeration stands in for the OS privacy switch: it fails or comes
// back empty while access is blocked.
#[cfg(not(target_os = "linux"))]
fn check_permission_by_enumeration() -> PermissionInfo {
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(devices) if !devices.is_empty() => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("Camera access granted ({} devices visible)", devices.len()),
            can_request: false,
        },
        Ok(_) => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No cameras found - permission may not be granted".to_string(),
            can_request: true,
        },
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Camera access denied: {}", e),
            can_request: true,
        },
    }
}

/// A single yes/no camera access request.
pub trait PermissionRequester: Send + Sync {
    fn request(&self) -> oneshot::Receiver<bool>;
}

/// Answers from the platform probe on a blocking task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPermissionRequester;

impl PermissionRequester for SystemPermissionRequester {
    fn request(&self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let info = check_permission_detailed();
            log::debug!("Camera permission probe: {} ({})", info.status, info.message);
            let _ = tx.send(info.status == PermissionStatus::Granted);
        });
        rx
    }
}

/// Records the outcome of the one permission request made per mount.
/// Nothing else waits on it.
#[derive(Debug, Default)]
pub struct PermissionGate {
    requested: bool,
    granted: Option<bool>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the request and forward its answer to the screen's event loop.
    /// Returns false if a request was already made.
    pub fn launch(
        &mut self,
        requester: &dyn PermissionRequester,
        events: mpsc::UnboundedSender<ScreenEvent>,
    ) -> bool {
        if self.requested {
            log::debug!("Camera permission already requested for this screen");
            return false;
        }
        self.requested = true;

        let answer = requester.request();
        tokio::spawn(async move {
            let granted = match answer.await {
                Ok(granted) => granted,
                Err(_) => {
                    log::warn!("Permission request ended without an answer, treating as denied");
                    false
                }
            };
            let _ = events.send(ScreenEvent::PermissionResult(granted));
        });
        true
    }

    pub fn record(&mut self, granted: bool) {
        self.granted = Some(granted);
        if granted {
            log::info!("Camera permission granted");
        } else {
            log::warn!("Camera permission denied");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    pub fn granted(&self) -> Option<bool> {
        self.granted
    }
}
