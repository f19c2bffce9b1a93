use std::sync::atomic::{AtomicBool, Ordering};

/// Receives the debug setting of every successfully fetched configuration.
///
/// Watchers report unconditionally after a successful read, even when the
/// delivery that follows is abandoned. Last write wins.
pub trait DebugReporter: Send + Sync {
    fn set_cloud_debug(&self, debug: bool);
    fn set_file_debug(&self, debug: bool);
}

static CLOUD_DEBUG: AtomicBool = AtomicBool::new(false);
static FILE_DEBUG: AtomicBool = AtomicBool::new(false);

/// Process-wide debug flags, one per configuration source kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessDebugFlags;

impl ProcessDebugFlags {
    pub fn cloud_debug(&self) -> bool {
        CLOUD_DEBUG.load(Ordering::Relaxed)
    }

    pub fn file_debug(&self) -> bool {
        FILE_DEBUG.load(Ordering::Relaxed)
    }

    /// True if either source last reported debug mode.
    pub fn debug_enabled(&self) -> bool {
        self.cloud_debug() || self.file_debug()
    }
}

impl DebugReporter for ProcessDebugFlags {
    fn set_cloud_debug(&self, debug: bool) {
        CLOUD_DEBUG.store(debug, Ordering::Relaxed);
    }

    fn set_file_debug(&self, debug: bool) {
        FILE_DEBUG.store(debug, Ordering::Relaxed);
    }
}
