#[cfg(test)]
mod commands_screen_tests {
    use std::path::Path;
    use std::time::{Duration, Instant};
    use stillshot::commands::screen::{
        get_preview_frame, get_screen_view, set_screen_active, start_camera_screen_with,
        stop_camera_screen, take_photo,
    };
    use stillshot::config::StillshotConfig;
    use stillshot::screen::{ScreenState, ScreenView};
    use stillshot::testing::{MockPermissionRequester, MockProvider};
    use tokio::sync::oneshot;

    async fn poll_view<F>(predicate: F) -> ScreenView
    where
        F: Fn(&ScreenView) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let view = get_screen_view().await.expect("screen running");
            if predicate(&view) {
                return view;
            }
            assert!(Instant::now() < deadline, "timed out, last view: {:?}", view);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    // One test drives the whole lifecycle: the plugin holds a single global screen.
    #[tokio::test]
    async fn test_screen_command_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StillshotConfig::default();
        config.storage.media_directory = dir.path().to_string_lossy().into_owned();

        let mock = MockProvider::new();
        let (tx, provider) = oneshot::channel();
        assert!(tx.send(Ok(mock.boxed())).is_ok());

        let initial =
            start_camera_screen_with(&config, &MockPermissionRequester::denying(), provider)
                .await
                .unwrap();
        assert_eq!(initial.trigger_label, "Take Photo");
        assert!(initial.preview_visible);

        let bound =
            poll_view(|v| v.state == ScreenState::Bound && v.permission_granted.is_some()).await;
        assert_eq!(bound.permission_granted, Some(false));
        assert!(get_preview_frame().await.unwrap().is_some());

        take_photo().await.unwrap();
        let captured = poll_view(|v| v.captures_finished == 1).await;
        let status = captured.status_line.expect("saved photo");
        assert!(Path::new(status.trim_start_matches("Photo saved to: ")).exists());

        set_screen_active(false).await.unwrap();
        poll_view(|v| v.state == ScreenState::Unbound).await;
        assert_eq!(mock.state().bind_calls, 1);

        set_screen_active(true).await.unwrap();
        poll_view(|v| v.state == ScreenState::Bound).await;
        assert_eq!(mock.state().bind_calls, 2);

        stop_camera_screen().await.unwrap();
        assert!(take_photo().await.is_err());
        assert!(stop_camera_screen().await.is_err());
    }
}
