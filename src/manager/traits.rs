//! Contracts for the manager's external collaborators.
//!
//! The manager core stays agnostic of how map files are probed, how archive
//! containers are read, and how bytes move over the network. Each concern is
//! a trait the [`ResourcesManager`](super::ResourcesManager) is generic over:
//!
//! - [`MapFileProbe`]: opens a map file and yields its metadata. The actual
//!   binary reader lives in a separate subsystem; no implementation ships
//!   here.
//! - [`ArchiveReader`]: lists and extracts ZIP-style containers. A default
//!   implementation backed by the `zip` crate is provided in this crate.
//! - [`WebClient`]: blocking HTTP transfers. A default implementation backed
//!   by `reqwest` is provided in this crate.

use std::path::Path;

use super::error::ManagerResult;
use crate::resource::MapFileInfo;

/// Progress callback for long-running transfers.
///
/// Called with `(transferred, total)` in bytes; `total` is `0` when unknown.
/// Returning `false` aborts the transfer.
pub type ProgressCallback = Box<dyn Fn(u64, u64) -> bool + Send + Sync>;

/// Reads metadata from a binary map file without loading its content.
pub trait MapFileProbe: Send + Sync {
    /// Open the file at `path` read-only and obtain its metadata.
    ///
    /// A file the probe cannot make sense of is an error; the caller decides
    /// whether that skips the file (scanner) or fails the operation
    /// (installer).
    fn probe(&self, path: &Path) -> ManagerResult<MapFileInfo>;
}

/// One entry of an archive container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveItem {
    /// Path of the entry inside the archive.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Modification time in ms since the Unix epoch, `0` when absent.
    pub modified: u64,
}

/// Lists and extracts ZIP-style archive containers.
pub trait ArchiveReader: Send + Sync {
    /// List the entries of the archive at `archive`.
    fn list_items(&self, archive: &Path) -> ManagerResult<Vec<ArchiveItem>>;

    /// Extract the single entry `item_name` to the file `dest`, discarding
    /// any directory structure inside the archive. Returns the number of
    /// bytes written.
    fn extract_item(&self, archive: &Path, item_name: &str, dest: &Path) -> ManagerResult<u64>;

    /// Extract every entry into `dest_dir`, preserving the archive's layout.
    /// Returns the total number of content bytes written.
    fn extract_all(&self, archive: &Path, dest_dir: &Path) -> ManagerResult<u64>;
}

/// Blocking HTTP client used for catalog and container downloads.
pub trait WebClient: Send + Sync {
    /// Fetch `url` and return the response body.
    fn download_bytes(&self, url: &str) -> ManagerResult<Vec<u8>>;

    /// Stream `url` into the file at `dest`, reporting progress along the
    /// way. Returns the number of bytes written.
    fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> ManagerResult<u64>;
}
