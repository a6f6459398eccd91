#[cfg(test)]
mod capture_tests {
    use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
    use std::sync::Arc;
    use stillshot::capture::{photo_file_name, CaptureController, CaptureOutcome};
    use stillshot::outputs::ImageCapture;
    use stillshot::testing::SyntheticSource;

    fn fixed_instant(ms: u32) -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2023, 11, 21)
            .unwrap()
            .and_hms_milli_opt(14, 30, 15, ms)
            .unwrap();
        Local.from_local_datetime(&naive).single().unwrap()
    }

    fn attached_capture(source: SyntheticSource) -> ImageCapture {
        let capture = ImageCapture::new(90);
        capture.attach(Arc::new(source));
        capture
    }

    #[test]
    fn test_trigger_without_capture_output_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let controller = CaptureController::new(dir.path());
        assert!(controller.trigger(None).is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_successful_capture_saves_requested_path() {
        let dir = tempfile::tempdir().unwrap();
        let controller = CaptureController::with_clock(dir.path(), Arc::new(|| fixed_instant(7)));

        let request = controller
            .trigger(Some(attached_capture(SyntheticSource::new(40, 30))))
            .expect("capture issued");
        let requested = request.path().to_path_buf();
        assert_eq!(
            requested.file_name().unwrap().to_str().unwrap(),
            "2023-11-21-14-30-15-007.jpg"
        );

        let outcome = request.outcome().await;
        assert_eq!(outcome, CaptureOutcome::Saved(requested.clone()));

        let bytes = std::fs::read(&requested).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "file should start with a JPEG SOI marker");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[tokio::test]
    async fn test_failed_capture_reports_message_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let controller = CaptureController::new(dir.path().join("media"));

        let request = controller
            .trigger(Some(attached_capture(SyntheticSource::failing(8, 8))))
            .unwrap();
        let path = request.path().to_path_buf();

        match request.outcome().await {
            CaptureOutcome::Failed(message) => {
                assert!(message.contains("synthetic sensor failure"), "{}", message)
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_media_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("Android").join("media").join("app");
        let controller = CaptureController::new(&media);

        let outcome = controller
            .trigger(Some(attached_capture(SyntheticSource::new(4, 4))))
            .unwrap()
            .outcome()
            .await;
        assert!(outcome.is_saved());
        assert!(media.is_dir());
    }

    #[tokio::test]
    async fn test_same_millisecond_captures_collide() {
        let dir = tempfile::tempdir().unwrap();
        let controller = CaptureController::with_clock(dir.path(), Arc::new(|| fixed_instant(500)));
        let capture = attached_capture(SyntheticSource::new(8, 8));

        let first = controller.trigger(Some(capture.clone())).unwrap();
        let second = controller.trigger(Some(capture)).unwrap();
        assert_eq!(first.path(), second.path());

        assert!(first.outcome().await.is_saved());
        assert!(second.outcome().await.is_saved());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_each_trigger_resolves_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let ticks = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let clock_ticks = ticks.clone();
        let controller = CaptureController::with_clock(
            dir.path(),
            Arc::new(move || {
                fixed_instant(clock_ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
            }),
        );
        let capture = attached_capture(SyntheticSource::new(8, 8));

        let requests: Vec<_> = (0..3)
            .map(|_| controller.trigger(Some(capture.clone())).unwrap())
            .collect();

        let mut saved = Vec::new();
        for request in requests {
            let path = request.path().to_path_buf();
            assert_eq!(request.outcome().await, CaptureOutcome::Saved(path.clone()));
            saved.push(path);
        }
        saved.dedup();
        assert_eq!(saved.len(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    mod file_name_props {
        use super::*;
        use proptest::prelude::*;

        // 2001-09-09 .. 2065-01-24, all four-digit years
        const MIN_MS: i64 = 1_000_000_000_000;
        const MAX_MS: i64 = 3_000_000_000_000;

        fn at_millis(ms: i64) -> DateTime<Utc> {
            DateTime::<Utc>::from_timestamp_millis(ms).unwrap()
        }

        proptest! {
            #[test]
            fn distinct_milliseconds_give_distinct_names(a in MIN_MS..MAX_MS, b in MIN_MS..MAX_MS) {
                prop_assume!(a != b);
                prop_assert_ne!(photo_file_name(&at_millis(a)), photo_file_name(&at_millis(b)));
            }

            #[test]
            fn same_millisecond_gives_same_name(ms in MIN_MS..MAX_MS) {
                prop_assert_eq!(photo_file_name(&at_millis(ms)), photo_file_name(&at_millis(ms)));
            }

            #[test]
            fn names_have_fixed_shape(ms in MIN_MS..MAX_MS) {
                let name = photo_file_name(&at_millis(ms));
                prop_assert_eq!(name.len(), 27);
                prop_assert!(name.ends_with(".jpg"));
                let stem = &name[..23];
                prop_assert_eq!(stem.split('-').count(), 7);
                prop_assert!(stem.chars().all(|c| c.is_ascii_digit() || c == '-'));
            }
        }
    }
}
