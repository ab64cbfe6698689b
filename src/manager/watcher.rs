//! Filesystem watcher bridge.
//!
//! Watches the extra storage roots for changes and funnels the raw
//! notifications through a debounce window, so a burst of events (one archive
//! extraction touches a directory many times) triggers a single rescan.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::error::{ManagerError, ManagerResult};

/// Handle to an active storage watcher.
///
/// Dropping the handle stops watching and joins the debounce thread.
#[derive(Debug)]
pub struct StorageWatcher {
    watcher: Option<RecommendedWatcher>,
    thread: Option<JoinHandle<()>>,
}

impl StorageWatcher {
    /// Watch `paths` and invoke `on_change` once per event burst.
    ///
    /// Paths that do not currently exist are skipped with a warning
    /// (removable media may be unmounted); watching an existing path must
    /// succeed.
    pub(crate) fn spawn<F>(
        paths: &[PathBuf],
        debounce: Duration,
        on_change: F,
    ) -> ManagerResult<Self>
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();

        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
                Ok(_) => {
                    let _ = tx.send(());
                }
                Err(error) => warn!(error = %error, "filesystem watcher error"),
            })
            .map_err(|e| ManagerError::WatchFailed {
                path: paths.first().cloned().unwrap_or_default(),
                reason: e.to_string(),
            })?;

        for path in paths {
            if !path.exists() {
                warn!(path = %path.display(), "storage path absent, not watching");
                continue;
            }
            watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|e| ManagerError::WatchFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            debug!(path = %path.display(), "watching storage path");
        }

        let thread = thread::spawn(move || debounce_loop(rx, debounce, on_change));

        Ok(Self {
            watcher: Some(watcher),
            thread: Some(thread),
        })
    }
}

impl Drop for StorageWatcher {
    fn drop(&mut self) {
        // Dropping the notify watcher drops the event sender, which
        // disconnects the channel and ends the debounce thread.
        self.watcher.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn debounce_loop<F: Fn()>(rx: Receiver<()>, debounce: Duration, on_change: F) {
    while rx.recv().is_ok() {
        // An event arrived; swallow the rest of the burst before firing.
        loop {
            match rx.recv_timeout(debounce) {
                Ok(()) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    on_change();
                    return;
                }
            }
        }
        on_change();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_event_burst_fires_once_per_window() {
        let storage = TempDir::new().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count_in_cb = Arc::clone(&count);

        let _watcher = StorageWatcher::spawn(
            &[storage.path().to_path_buf()],
            Duration::from_millis(100),
            move || {
                count_in_cb.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        for i in 0..3 {
            fs::write(storage.path().join(format!("file{}.obf", i)), b"x").unwrap();
        }
        thread::sleep(Duration::from_millis(700));

        let fired = count.load(Ordering::SeqCst);
        assert!(fired >= 1, "expected at least one rescan, got {}", fired);
        assert!(fired <= 3, "expected coalesced rescans, got {}", fired);
    }

    #[test]
    fn test_separate_bursts_fire_separately() {
        let storage = TempDir::new().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count_in_cb = Arc::clone(&count);

        let _watcher = StorageWatcher::spawn(
            &[storage.path().to_path_buf()],
            Duration::from_millis(50),
            move || {
                count_in_cb.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        fs::write(storage.path().join("a.obf"), b"x").unwrap();
        thread::sleep(Duration::from_millis(400));
        let after_first = count.load(Ordering::SeqCst);

        fs::write(storage.path().join("b.obf"), b"x").unwrap();
        thread::sleep(Duration::from_millis(400));
        let after_second = count.load(Ordering::SeqCst);

        assert!(after_first >= 1);
        assert!(after_second > after_first);
    }

    #[test]
    fn test_missing_path_is_skipped() {
        let watcher = StorageWatcher::spawn(
            &[PathBuf::from("/nonexistent/mapvault-watch")],
            Duration::from_millis(50),
            || {},
        );
        assert!(watcher.is_ok());
    }

    #[test]
    fn test_drop_stops_cleanly() {
        let storage = TempDir::new().unwrap();
        let watcher = StorageWatcher::spawn(
            &[storage.path().to_path_buf()],
            Duration::from_millis(50),
            || {},
        )
        .unwrap();
        drop(watcher);
    }
}
