//! Install and uninstall pipeline.
//!
//! The functions here perform the per-variant filesystem work: validating an
//! archive, extracting it into local storage, and tearing a resource back
//! down. Registry membership checks and lock discipline stay with the
//! façade, which calls in here while holding the local writer lock.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};
use tracing::{debug, warn};

use super::error::{ManagerError, ManagerResult};
use super::scanner::{mtime_ms, SIZE_SIDECAR, TIMESTAMP_SIDECAR, VOICE_CONFIG_FILE};
use super::traits::{ArchiveReader, MapFileProbe};
use crate::resource::LocalResource;

/// Install a map region from an archive file.
///
/// Picks the first `.obf` entry of the archive, extracts it flat to
/// `<local_storage>/<name>`, and probes the result. A file the probe rejects
/// is deleted again so no unreadable map lingers in storage.
pub(crate) fn install_map_region<P, A>(
    probe: &P,
    archive: &A,
    local_storage: &Path,
    name: &str,
    file_path: &Path,
) -> ManagerResult<LocalResource>
where
    P: MapFileProbe + ?Sized,
    A: ArchiveReader + ?Sized,
{
    let items = archive.list_items(file_path)?;
    let obf_item = items
        .iter()
        .find(|item| item.name.ends_with(".obf"))
        .ok_or_else(|| ManagerError::ArchiveMalformed {
            path: file_path.to_path_buf(),
            reason: "archive contains no .obf entry".to_string(),
        })?;

    ensure_dir(local_storage)?;
    let dest = local_storage.join(name);
    archive.extract_item(file_path, &obf_item.name, &dest)?;

    let map_info = match probe.probe(&dest) {
        Ok(info) => info,
        Err(e) => {
            warn!(path = %dest.display(), error = %e, "extracted map file failed probe, deleting");
            if let Err(remove_err) = fs::remove_file(&dest) {
                warn!(path = %dest.display(), error = %remove_err, "failed to delete rejected map file");
            }
            return Err(e);
        }
    };

    let metadata = fs::metadata(&dest).map_err(|e| ManagerError::ReadFailed {
        path: dest.clone(),
        source: e,
    })?;

    debug!(name, path = %dest.display(), size = metadata.len(), "installed map region");
    Ok(LocalResource::map_region(
        name,
        mtime_ms(&metadata),
        metadata.len(),
        dest,
        map_info,
    )?)
}

/// Install a voice pack from an archive file.
///
/// The archive must carry a `_config.p` entry. All entries are extracted
/// into `<local_storage>/<name>/` preserving the archive layout, and the
/// `.timestamp` / `.size` sidecars are written from the `_config.p` entry's
/// modification time and the accumulated content size.
pub(crate) fn install_voice_pack<A>(
    archive: &A,
    local_storage: &Path,
    name: &str,
    file_path: &Path,
) -> ManagerResult<LocalResource>
where
    A: ArchiveReader + ?Sized,
{
    let items = archive.list_items(file_path)?;
    let config_item = items
        .iter()
        .find(|item| item.name == VOICE_CONFIG_FILE)
        .ok_or_else(|| ManagerError::ArchiveMalformed {
            path: file_path.to_path_buf(),
            reason: format!("archive contains no {} entry", VOICE_CONFIG_FILE),
        })?;
    let timestamp = config_item.modified;

    ensure_dir(local_storage)?;
    let dest_dir = local_storage.join(name);

    let content_size = match archive.extract_all(file_path, &dest_dir) {
        Ok(size) => size,
        Err(e) => {
            remove_partial_dir(&dest_dir);
            return Err(e);
        }
    };

    if let Err(e) = write_sidecars(&dest_dir, timestamp, content_size) {
        remove_partial_dir(&dest_dir);
        return Err(e);
    }

    debug!(name, path = %dest_dir.display(), content_size, "installed voice pack");
    Ok(LocalResource::voice_pack(
        name,
        timestamp,
        content_size,
        dest_dir,
    )?)
}

/// Write the `.timestamp` and `.size` sidecar files of a voice pack.
pub(crate) fn write_sidecars(dir: &Path, timestamp: u64, content_size: u64) -> ManagerResult<()> {
    let timestamp_path = dir.join(TIMESTAMP_SIDECAR);
    fs::write(&timestamp_path, timestamp.to_string()).map_err(|e| ManagerError::WriteFailed {
        path: timestamp_path,
        source: e,
    })?;

    let size_path = dir.join(SIZE_SIDECAR);
    fs::write(&size_path, content_size.to_string()).map_err(|e| ManagerError::WriteFailed {
        path: size_path,
        source: e,
    })?;

    Ok(())
}

/// Delete a resource's backing file or directory.
///
/// Map regions get their removal lock engaged first so snapshot holders can
/// observe the flag. A target that is already gone counts as success: the
/// goal state holds, and the stale registry entry should still be evicted.
pub(crate) fn remove_from_disk(resource: &LocalResource) -> ManagerResult<()> {
    let path = resource.local_path();
    let result = match resource {
        LocalResource::MapRegion { removal_lock, .. } => {
            removal_lock.engage();
            fs::remove_file(path)
        }
        LocalResource::VoicePack { .. } => fs::remove_dir_all(path),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "resource already absent from disk");
            Ok(())
        }
        Err(e) => Err(ManagerError::RemoveFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Compose a collision-free temp path for an in-flight container download.
pub(crate) fn temp_download_path(temp_dir: &Path, name: &str) -> PathBuf {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    temp_dir.join(format!("{:x}.{}", Md5::digest(name.as_bytes()), now_ms))
}

/// Guess a resource name from an archive path: the file name minus a `.zip`
/// suffix.
pub(crate) fn guessed_name(file_path: &Path) -> Option<String> {
    let file_name = file_path.file_name()?.to_string_lossy();
    Some(
        file_name
            .strip_suffix(".zip")
            .unwrap_or(&file_name)
            .to_string(),
    )
}

fn ensure_dir(dir: &Path) -> ManagerResult<()> {
    fs::create_dir_all(dir).map_err(|e| ManagerError::CreateDirFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

fn remove_partial_dir(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %dir.display(), error = %e, "failed to clean up partial extraction");
        }
    }
}
