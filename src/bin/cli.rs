use anyhow::{bail, Context, Result};
use stillshot::permissions::SystemPermissionRequester;
use stillshot::platform::NokhwaProvider;
use stillshot::screen::{spawn_screen, ScreenState};
use stillshot::session::request_provider;
use stillshot::{CameraProvider, StillshotConfig};
use std::env;
use std::time::Duration;

const BIND_TIMEOUT: Duration = Duration::from_secs(15);
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    stillshot::init_logging();
    let info = stillshot::get_info();
    log::info!("{} v{} starting", info.name, info.version);

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: stillshot-cli [media_dir]");
        std::process::exit(1);
    }

    let mut config = StillshotConfig::load_or_default();
    if let Some(dir) = args.get(1) {
        config.storage.media_directory = dir.clone();
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let provider = request_provider(|| {
        NokhwaProvider::initialize().map(|p| Box::new(p) as Box<dyn CameraProvider>)
    });

    let (handle, screen) = spawn_screen(&config, &SystemPermissionRequester, provider);

    handle
        .wait_for(BIND_TIMEOUT, |v| v.state == ScreenState::Bound)
        .await
        .context("camera never became ready")?;

    handle.trigger()?;
    let view = handle
        .wait_for(CAPTURE_TIMEOUT, |v| v.captures_finished >= 1)
        .await
        .context("capture did not finish")?;

    handle.teardown()?;
    screen.await.context("screen task failed")?;

    match view.status_line {
        Some(status) => {
            println!("{}", status);
            Ok(())
        }
        None => bail!("Photo capture failed, see log for details"),
    }
}
