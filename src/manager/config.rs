//! Configuration for the Resources Manager.

use std::path::PathBuf;
use std::time::Duration;

use super::error::{ManagerError, ManagerResult};

/// Default debounce window for watcher-driven rescans.
///
/// Filesystem events arrive in bursts (an install touches a directory many
/// times in quick succession); one rescan per burst is enough.
pub const DEFAULT_WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default timeout for HTTP requests.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for the Resources Manager.
///
/// All values are provided at construction; nothing is discovered at runtime.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Directory where installed resources live.
    pub local_storage_path: PathBuf,

    /// Directory for in-flight download files.
    pub local_temporary_path: PathBuf,

    /// Additional read-only storage roots included in scans and watched for
    /// changes (e.g. an external SD card).
    pub extra_storage_paths: Vec<PathBuf>,

    /// Base URL of the remote repository, without a trailing slash.
    pub repository_base_url: String,

    /// Debounce window for watcher-driven rescans.
    pub watch_debounce: Duration,

    /// HTTP request timeout.
    pub download_timeout: Duration,
}

impl ManagerConfig {
    /// Create a configuration with the given storage layout and repository.
    pub fn new(
        local_storage_path: impl Into<PathBuf>,
        local_temporary_path: impl Into<PathBuf>,
        repository_base_url: impl Into<String>,
    ) -> Self {
        Self {
            local_storage_path: local_storage_path.into(),
            local_temporary_path: local_temporary_path.into(),
            extra_storage_paths: Vec::new(),
            repository_base_url: repository_base_url.into(),
            watch_debounce: DEFAULT_WATCH_DEBOUNCE,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    /// Add an extra storage root.
    pub fn with_extra_storage(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_storage_paths.push(path.into());
        self
    }

    /// Set the watcher debounce window.
    pub fn with_watch_debounce(mut self, debounce: Duration) -> Self {
        self.watch_debounce = debounce;
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Validate the configuration.
    ///
    /// Storage and temporary paths must be absolute, extra roots must be
    /// absolute, and the repository URL must be non-empty. A trailing slash
    /// on the base URL is stripped so endpoint composition stays uniform.
    pub(crate) fn validated(mut self) -> ManagerResult<Self> {
        if !self.local_storage_path.is_absolute() {
            return Err(ManagerError::InvalidConfig(format!(
                "local storage path must be absolute: {}",
                self.local_storage_path.display()
            )));
        }
        if !self.local_temporary_path.is_absolute() {
            return Err(ManagerError::InvalidConfig(format!(
                "local temporary path must be absolute: {}",
                self.local_temporary_path.display()
            )));
        }
        for path in &self.extra_storage_paths {
            if !path.is_absolute() {
                return Err(ManagerError::InvalidConfig(format!(
                    "extra storage path must be absolute: {}",
                    path.display()
                )));
            }
        }
        if self.repository_base_url.is_empty() {
            return Err(ManagerError::InvalidConfig(
                "repository base URL must not be empty".to_string(),
            ));
        }
        while self.repository_base_url.ends_with('/') {
            self.repository_base_url.pop();
        }
        Ok(self)
    }
}
