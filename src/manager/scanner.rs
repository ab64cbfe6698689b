//! Local storage scanner.
//!
//! Walks the configured storage roots (non-recursively) and builds a fresh
//! name-to-resource map: `*.obf` files become map regions, `*.voice`
//! directories become voice packs. The caller swaps the result into the
//! registry only when every root scanned cleanly.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, warn};

use super::error::{ManagerError, ManagerResult};
use super::traits::MapFileProbe;
use crate::resource::LocalResource;

/// Voice pack descriptor file; a directory without it is not a usable pack.
pub(crate) const VOICE_CONFIG_FILE: &str = "_config.p";
/// Sidecar holding the pack's publication timestamp (ASCII ms since epoch).
pub(crate) const TIMESTAMP_SIDECAR: &str = ".timestamp";
/// Sidecar holding the pack's content size (ASCII bytes).
pub(crate) const SIZE_SIDECAR: &str = ".size";

/// Scan the primary storage root and every extra root.
///
/// Fails on the first root that cannot be enumerated; the partial result is
/// discarded in that case. Roots that do not exist scan as empty (extra
/// storage may be removable media).
pub(crate) fn scan_all<P: MapFileProbe + ?Sized>(
    probe: &P,
    primary: &Path,
    extras: &[PathBuf],
) -> ManagerResult<HashMap<String, LocalResource>> {
    let mut resources = HashMap::new();
    scan_storage_path(probe, primary, &mut resources)?;
    for extra in extras {
        scan_storage_path(probe, extra, &mut resources)?;
    }
    Ok(resources)
}

fn scan_storage_path<P: MapFileProbe + ?Sized>(
    probe: &P,
    storage_path: &Path,
    out: &mut HashMap<String, LocalResource>,
) -> ManagerResult<()> {
    if !storage_path.is_dir() {
        debug!(path = %storage_path.display(), "storage path absent, scanning as empty");
        return Ok(());
    }

    let entries = fs::read_dir(storage_path).map_err(|e| ManagerError::ReadFailed {
        path: storage_path.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ManagerError::ReadFailed {
            path: storage_path.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();

        if path.is_file() && file_name.ends_with(".obf") {
            if let Some(resource) = scan_map_region(probe, &path, &file_name)? {
                insert_unique(out, resource);
            }
        } else if path.is_dir() && file_name.ends_with(".voice") {
            let resource = scan_voice_pack(&path, &file_name)?;
            insert_unique(out, resource);
        }
    }

    Ok(())
}

/// Probe one `.obf` file. A file the probe rejects is skipped with a warning
/// rather than failing the scan; it may be half-written or foreign.
fn scan_map_region<P: MapFileProbe + ?Sized>(
    probe: &P,
    path: &Path,
    file_name: &str,
) -> ManagerResult<Option<LocalResource>> {
    let map_info = match probe.probe(path) {
        Ok(info) => info,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable map file");
            return Ok(None);
        }
    };

    let metadata = fs::metadata(path).map_err(|e| ManagerError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let resource = LocalResource::map_region(
        file_name,
        mtime_ms(&metadata),
        metadata.len(),
        path,
        map_info,
    )?;
    Ok(Some(resource))
}

/// Describe one `.voice` directory from its sidecar files.
///
/// Timestamp falls back to the `_config.p` mtime, then to `0`; content size
/// falls back to `0`. The sidecars are rewritten on the next install, so a
/// pack dropped in by hand still scans.
fn scan_voice_pack(path: &Path, dir_name: &str) -> ManagerResult<LocalResource> {
    let timestamp = read_sidecar_u64(&path.join(TIMESTAMP_SIDECAR))
        .or_else(|| {
            let config = path.join(VOICE_CONFIG_FILE);
            fs::metadata(&config).ok().map(|m| mtime_ms(&m))
        })
        .unwrap_or(0);

    let content_size = read_sidecar_u64(&path.join(SIZE_SIDECAR)).unwrap_or(0);

    Ok(LocalResource::voice_pack(
        dir_name,
        timestamp,
        content_size,
        path,
    )?)
}

fn insert_unique(out: &mut HashMap<String, LocalResource>, resource: LocalResource) {
    if out.contains_key(resource.name()) {
        warn!(
            name = resource.name(),
            path = %resource.local_path().display(),
            "duplicate resource name across storage roots, keeping first"
        );
        return;
    }
    out.insert(resource.name().to_string(), resource);
}

/// Read a sidecar file holding a single ASCII integer.
fn read_sidecar_u64(path: &Path) -> Option<u64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

pub(crate) fn mtime_ms(metadata: &fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
