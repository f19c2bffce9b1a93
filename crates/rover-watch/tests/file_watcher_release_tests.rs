//! OS resource release on FileWatcher close.
//!
//! Kept in its own test binary: it counts process-wide inotify descriptors,
//! so no other watcher may be alive in the process while it runs.

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use rover_watch::mock::RecordingReporter;
    use rover_watch::{FileWatcher, Watcher};
    use std::sync::Arc;
    use std::time::Duration;

    fn inotify_fds() -> usize {
        std::fs::read_dir("/proc/self/fd")
            .unwrap()
            .filter_map(|entry| std::fs::read_link(entry.ok()?.path()).ok())
            .filter(|target| target.to_string_lossy().contains("inotify"))
            .count()
    }

    /// The notify event loop closes its descriptor on its own thread, so
    /// give it a moment after shutdown.
    async fn wait_for_inotify_fds(expected: usize) -> usize {
        for _ in 0..100 {
            let count = inotify_fds();
            if count == expected {
                return count;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        inotify_fds()
    }

    #[tokio::test]
    async fn test_close_releases_inotify_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robot.json");
        std::fs::write(&path, "{}").unwrap();

        let before = inotify_fds();
        let mut watcher = FileWatcher::new(path, Arc::new(RecordingReporter::new())).unwrap();
        assert_eq!(inotify_fds(), before + 1);

        watcher.close().await.unwrap();
        // Watcher value still alive: close alone must have released the instance.
        assert_eq!(wait_for_inotify_fds(before).await, before);

        watcher.close().await.unwrap();
        drop(watcher);
        assert_eq!(inotify_fds(), before);
    }
}
