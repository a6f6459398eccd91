#[cfg(test)]
mod session_tests {
    use stillshot::config::StillshotConfig;
    use stillshot::errors::CameraError;
    use stillshot::outputs::PreviewSurface;
    use stillshot::session::{request_provider, CameraProvider, SessionConfig, SessionManager};
    use stillshot::testing::MockProvider;
    use stillshot::types::{CameraFormat, CameraSelector, LifecycleOwner};

    fn ready_manager(mock: &MockProvider, owner: &LifecycleOwner) -> SessionManager {
        let mut manager = SessionManager::new(SessionConfig::default(), PreviewSurface::new());
        manager
            .on_provider_ready(mock.boxed(), owner)
            .expect("initial bind should succeed");
        manager
    }

    #[test]
    fn test_bind_twice_leaves_one_binding() {
        let mock = MockProvider::new();
        let owner = LifecycleOwner::new("screen");
        let mut manager = ready_manager(&mock, &owner);

        let first_capture = manager.current_capture_output().unwrap();
        let first_session = manager.session().unwrap().id();

        let second_session = manager.bind(&owner).unwrap().id();
        let second_capture = manager.current_capture_output().unwrap();

        assert_ne!(first_session, second_session);
        assert_ne!(first_capture.id(), second_capture.id());
        assert_eq!(manager.active_bindings(), 1);
        assert_eq!(mock.bound_count(), 1);
        assert!(!first_capture.is_attached(), "old handle must be released");
        assert!(second_capture.is_attached());

        let state = mock.state();
        assert_eq!(state.bind_calls, 2);
        assert!(state.unbind_calls >= 2, "every bind clears first");
    }

    #[test]
    fn test_bind_uses_rear_camera_and_owner() {
        let mock = MockProvider::new();
        let owner = LifecycleOwner::new("screen");
        let manager = ready_manager(&mock, &owner);

        let session = manager.session().unwrap();
        assert_eq!(session.selector(), CameraSelector::Back);
        assert_eq!(session.owner(), &owner);

        let state = mock.state();
        assert_eq!(state.last_selector, Some(CameraSelector::Back));
        assert_eq!(state.last_owner.as_ref(), Some(&owner));
    }

    #[test]
    fn test_bind_before_provider_is_ready() {
        let mut manager = SessionManager::new(SessionConfig::default(), PreviewSurface::new());
        let owner = LifecycleOwner::new("screen");

        assert!(matches!(
            manager.bind(&owner),
            Err(CameraError::InitializationError(_))
        ));
        assert!(manager.on_activate(&owner).is_err());
        assert!(manager.current_capture_output().is_none());
        assert_eq!(manager.active_bindings(), 0);
    }

    #[test]
    fn test_failed_bind_keeps_stale_handle() {
        let mock = MockProvider::new();
        mock.fail_binds(1);
        let owner = LifecycleOwner::new("screen");
        let mut manager = SessionManager::new(SessionConfig::default(), PreviewSurface::new());

        let result = manager.on_provider_ready(mock.boxed(), &owner);
        assert!(matches!(result, Err(CameraError::BindError(_))));
        assert!(!manager.is_bound());
        assert_eq!(manager.active_bindings(), 0);

        let stale = manager
            .current_capture_output()
            .expect("handle survives a failed bind");
        assert!(!stale.is_attached());

        // Next activation binds again
        manager.on_activate(&owner).unwrap();
        assert!(manager.is_bound());
        assert_ne!(manager.current_capture_output().unwrap().id(), stale.id());
    }

    #[test]
    fn test_ensure_bound_reuses_unchanged_session() {
        let mock = MockProvider::new();
        let owner = LifecycleOwner::new("screen");
        let mut manager = ready_manager(&mock, &owner);
        let original = manager.session().unwrap().id();

        let again = manager.ensure_bound(&owner).unwrap().id();
        assert_eq!(original, again);
        assert_eq!(mock.state().bind_calls, 1);

        let other_owner = LifecycleOwner::new("other");
        let rebound = manager.ensure_bound(&other_owner).unwrap().id();
        assert_ne!(original, rebound);
        assert_eq!(mock.state().bind_calls, 2);
    }

    #[test]
    fn test_ensure_bound_rebinds_on_config_change() {
        let mock = MockProvider::new();
        let owner = LifecycleOwner::new("screen");
        let mut manager = ready_manager(&mock, &owner);
        let original = manager.session().unwrap().id();

        let mut config = SessionConfig::default();
        config.jpeg_quality = 70;
        manager.set_config(config);

        let session = manager.ensure_bound(&owner).unwrap();
        assert_ne!(session.id(), original);
        assert_eq!(session.config().jpeg_quality, 70);
        assert_eq!(session.capture_output().jpeg_quality(), 70);
    }

    #[test]
    fn test_loaded_config_still_binds_rear_camera() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stillshot.toml");
        std::fs::write(
            &path,
            "[camera]\nselector = \"front\"\nresolution = [640, 480]\nfps = 15\n\n\
             [storage]\nmedia_directory = \"photos\"\njpeg_quality = 90\n",
        )
        .unwrap();
        let config = StillshotConfig::load_from_file(&path).unwrap();

        let mock = MockProvider::new();
        let owner = LifecycleOwner::new("screen");
        let mut manager = SessionManager::new(SessionConfig::from(&config), PreviewSurface::new());
        let session = manager.on_provider_ready(mock.boxed(), &owner).unwrap();
        assert_eq!(session.selector(), CameraSelector::Back);
        assert_eq!(mock.state().last_selector, Some(CameraSelector::Back));
    }

    #[test]
    fn test_configured_format_reaches_provider() {
        let mock = MockProvider::new();
        let owner = LifecycleOwner::new("screen");
        let mut manager = ready_manager(&mock, &owner);
        assert_eq!(mock.state().last_format, Some(CameraFormat::standard()));

        let mut config = SessionConfig::default();
        config.format = CameraFormat::new(640, 480, 15.0);
        manager.set_config(config);
        manager.ensure_bound(&owner).unwrap();

        let state = mock.state();
        assert_eq!(state.bind_calls, 2);
        assert_eq!(state.last_format, Some(CameraFormat::new(640, 480, 15.0)));
    }

    #[test]
    fn test_deactivate_releases_binding() {
        let mock = MockProvider::new();
        let owner = LifecycleOwner::new("screen");
        let mut manager = ready_manager(&mock, &owner);

        manager.on_deactivate();
        assert!(!manager.is_bound());
        assert_eq!(manager.active_bindings(), 0);

        let handle = manager.current_capture_output().unwrap();
        assert!(!handle.is_attached());

        manager.on_activate(&owner).unwrap();
        assert!(manager.is_bound());
        assert_eq!(manager.active_bindings(), 1);
    }

    #[test]
    fn test_bind_feeds_preview_surface() {
        let mock = MockProvider::new();
        let owner = LifecycleOwner::new("screen");
        let surface = PreviewSurface::new();
        let mut manager = SessionManager::new(SessionConfig::default(), surface.clone());
        assert!(surface.latest_frame().is_none());

        manager.on_provider_ready(mock.boxed(), &owner).unwrap();
        let frame = surface.latest_frame().expect("mock pushes a preview frame");
        assert!(frame.is_valid());
    }

    #[tokio::test]
    async fn test_request_provider_resolves_once() {
        let mock = MockProvider::new();
        let clone = mock.clone();
        let ready = request_provider(move || Ok(clone.boxed()))
            .await
            .expect("factory result delivered");
        assert_eq!(ready.map(|p| p.bound_count()).unwrap(), 0);

        let failed = request_provider(|| {
            Err(CameraError::InitializationError("no cameras".to_string()))
        })
        .await
        .unwrap();
        assert!(failed.is_err());
    }
}
