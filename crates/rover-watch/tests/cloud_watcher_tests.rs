//! CloudWatcher timing and shutdown tests, run on a paused clock.

#[cfg(test)]
mod tests {
    use rover_config::{CloudConfig, Config};
    use rover_watch::mock::{MockCloudReader, RecordingReporter};
    use rover_watch::{CloudWatcher, ConfigSource, Watcher};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{Instant, sleep, timeout};

    fn cloud() -> CloudConfig {
        CloudConfig {
            id: "part-1".into(),
            secret: "s3cr3t".into(),
            app_address: "https://app.example.com".into(),
            ..Default::default()
        }
    }

    fn initial(refresh_ms: u64) -> Config {
        Config {
            cloud: Some(CloudConfig {
                refresh_interval_ms: refresh_ms,
                ..cloud()
            }),
            ..Default::default()
        }
    }

    fn snapshot(debug: bool) -> Config {
        Config {
            cloud: Some(cloud()),
            debug,
            ..Default::default()
        }
    }

    fn assert_near(actual: Duration, expected: Duration) {
        let slack = Duration::from_millis(5);
        assert!(
            actual >= expected && actual <= expected + slack,
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    // ── Polling cadence ────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_first_read_at_fifth_of_interval_then_full_interval() {
        let reader = Arc::new(MockCloudReader::new(snapshot(false)));
        let start = Instant::now();
        let mut watcher =
            CloudWatcher::new(initial(1000), reader.clone(), Arc::new(RecordingReporter::new()))
                .unwrap();
        assert_eq!(watcher.source(), ConfigSource::Cloud);

        for _ in 0..3 {
            watcher.config().recv().await.unwrap();
        }
        watcher.close().await.unwrap();

        let calls = reader.calls.lock().clone();
        assert_eq!(calls.len(), 3);
        assert_near(calls[0].at - start, Duration::from_millis(200));
        assert_near(calls[1].at - calls[0].at, Duration::from_millis(1000));
        assert_near(calls[2].at - calls[1].at, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_read_retries_on_next_tick() {
        let reader = Arc::new(MockCloudReader::new(snapshot(true)).with_error("app unreachable"));
        let start = Instant::now();
        let mut watcher =
            CloudWatcher::new(initial(1000), reader.clone(), Arc::new(RecordingReporter::new()))
                .unwrap();

        let delivered = watcher.config().recv().await.unwrap();
        assert!(delivered.debug);
        assert_near(start.elapsed(), Duration::from_millis(1200));
        assert_eq!(reader.call_count(), 2);
        watcher.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cert_check_runs_hourly() {
        let reader = Arc::new(MockCloudReader::new(snapshot(false)));
        // 20 minute interval: reads at 4, 24, 44, 64 and 84 minutes.
        let mut watcher = CloudWatcher::new(
            initial(20 * 60 * 1000),
            reader.clone(),
            Arc::new(RecordingReporter::new()),
        )
        .unwrap();
        for _ in 0..5 {
            watcher.config().recv().await.unwrap();
        }
        watcher.close().await.unwrap();

        let flags: Vec<bool> = reader.calls.lock().iter().map(|c| c.check_cert).collect();
        assert_eq!(flags, vec![false, false, false, true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_previous_snapshot_is_public_copy() {
        let reader = Arc::new(MockCloudReader::new(snapshot(true)));
        let mut watcher =
            CloudWatcher::new(initial(1000), reader.clone(), Arc::new(RecordingReporter::new()))
                .unwrap();
        watcher.config().recv().await.unwrap();
        watcher.config().recv().await.unwrap();
        watcher.close().await.unwrap();

        let calls = reader.calls.lock().clone();
        assert!(calls[0].previous.is_none());
        let previous = calls[1].previous.as_ref().unwrap();
        assert!(previous.debug);
        let cloud = previous.cloud.as_ref().unwrap();
        assert_eq!(cloud.id, "part-1");
        assert!(cloud.secret.is_empty());
    }

    // ── Backpressure ───────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_slow_consumer_stalls_reads() {
        let reader = Arc::new(MockCloudReader::new(snapshot(false)));
        let mut watcher =
            CloudWatcher::new(initial(1000), reader.clone(), Arc::new(RecordingReporter::new()))
                .unwrap();

        sleep(Duration::from_secs(10)).await;
        assert_eq!(reader.call_count(), 1);

        watcher.config().recv().await.unwrap();
        watcher.config().recv().await.unwrap();
        assert_eq!(reader.call_count(), 2);
        watcher.close().await.unwrap();
    }

    // ── Shutdown ───────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_close_during_interval_wait() {
        let reader = Arc::new(MockCloudReader::new(snapshot(false)));
        let mut watcher =
            CloudWatcher::new(initial(1000), reader.clone(), Arc::new(RecordingReporter::new()))
                .unwrap();
        watcher.close().await.unwrap();
        assert_eq!(reader.call_count(), 0);
        assert!(watcher.config().recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_abandons_blocked_delivery_but_debug_is_reported() {
        let reader = Arc::new(MockCloudReader::new(snapshot(true)));
        let reporter = Arc::new(RecordingReporter::new());
        let mut watcher = CloudWatcher::new(initial(1000), reader.clone(), reporter.clone()).unwrap();

        // Past the first read; nobody is receiving, so the delivery is pending.
        sleep(Duration::from_millis(250)).await;
        assert_eq!(reader.call_count(), 1);
        assert_eq!(reporter.last_cloud_debug(), Some(true));

        timeout(Duration::from_secs(1), watcher.close())
            .await
            .expect("close must not wait for the consumer")
            .unwrap();
        assert!(watcher.config().recv().await.is_none());
        assert_eq!(reader.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_twice_is_harmless() {
        let reader = Arc::new(MockCloudReader::new(snapshot(false)));
        let mut watcher =
            CloudWatcher::new(initial(1000), reader, Arc::new(RecordingReporter::new())).unwrap();
        watcher.close().await.unwrap();
        watcher.close().await.unwrap();
    }

    // ── Construction ───────────────────────────────────────────

    #[tokio::test]
    async fn test_requires_cloud_section() {
        let reader = Arc::new(MockCloudReader::new(Config::default()));
        let result = CloudWatcher::new(
            Config::default(),
            reader,
            Arc::new(RecordingReporter::new()),
        );
        assert!(result.is_err());
    }
}
