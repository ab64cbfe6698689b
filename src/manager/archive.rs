//! ZIP-backed implementation of the [`ArchiveReader`] contract.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use zip::ZipArchive;

use super::error::{ManagerError, ManagerResult};
use super::traits::{ArchiveItem, ArchiveReader};

/// Archive reader for ZIP containers, backed by the `zip` crate.
///
/// Directory entries are not reported as items; they are recreated implicitly
/// during extraction.
#[derive(Debug, Default)]
pub struct ZipArchiveReader;

impl ZipArchiveReader {
    /// Create a new ZIP archive reader.
    pub fn new() -> Self {
        Self
    }

    fn open(&self, archive: &Path) -> ManagerResult<ZipArchive<File>> {
        let file = File::open(archive).map_err(|e| ManagerError::ReadFailed {
            path: archive.to_path_buf(),
            source: e,
        })?;
        ZipArchive::new(file).map_err(|e| ManagerError::ArchiveMalformed {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl ArchiveReader for ZipArchiveReader {
    fn list_items(&self, archive: &Path) -> ManagerResult<Vec<ArchiveItem>> {
        let mut zip = self.open(archive)?;
        let mut items = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let entry = zip
                .by_index(index)
                .map_err(|e| ManagerError::ArchiveMalformed {
                    path: archive.to_path_buf(),
                    reason: e.to_string(),
                })?;
            if entry.is_dir() {
                continue;
            }
            items.push(ArchiveItem {
                name: entry.name().to_string(),
                size: entry.size(),
                modified: entry.last_modified().map(datetime_ms).unwrap_or(0),
            });
        }
        Ok(items)
    }

    fn extract_item(&self, archive: &Path, item_name: &str, dest: &Path) -> ManagerResult<u64> {
        let mut zip = self.open(archive)?;
        let mut entry = zip
            .by_name(item_name)
            .map_err(|e| ManagerError::ArchiveMalformed {
                path: archive.to_path_buf(),
                reason: format!("entry '{}': {}", item_name, e),
            })?;

        let mut out = File::create(dest).map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;
        io::copy(&mut entry, &mut out).map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })
    }

    fn extract_all(&self, archive: &Path, dest_dir: &Path) -> ManagerResult<u64> {
        let mut zip = self.open(archive)?;
        fs::create_dir_all(dest_dir).map_err(|e| ManagerError::CreateDirFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let mut total = 0;
        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| ManagerError::ArchiveMalformed {
                    path: archive.to_path_buf(),
                    reason: e.to_string(),
                })?;

            // Reject entries that would escape the destination root.
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ManagerError::ArchiveMalformed {
                    path: archive.to_path_buf(),
                    reason: format!("entry '{}' has an unsafe path", entry.name()),
                })?;
            let dest = dest_dir.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&dest).map_err(|e| ManagerError::CreateDirFailed {
                    path: dest.clone(),
                    source: e,
                })?;
                continue;
            }

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| ManagerError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            let mut out = File::create(&dest).map_err(|e| ManagerError::WriteFailed {
                path: dest.clone(),
                source: e,
            })?;
            total += io::copy(&mut entry, &mut out).map_err(|e| ManagerError::WriteFailed {
                path: dest.clone(),
                source: e,
            })?;
        }
        Ok(total)
    }
}

/// Convert a ZIP header date to ms since the Unix epoch.
fn datetime_ms(datetime: zip::DateTime) -> u64 {
    chrono::NaiveDate::from_ymd_opt(
        datetime.year() as i32,
        datetime.month() as u32,
        datetime.day() as u32,
    )
    .and_then(|date| {
        date.and_hms_opt(
            datetime.hour() as u32,
            datetime.minute() as u32,
            datetime.second() as u32,
        )
    })
    .map(|naive| naive.and_utc().timestamp_millis().max(0) as u64)
    .unwrap_or(0)
}
