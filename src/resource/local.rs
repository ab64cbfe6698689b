//! Locally installed resource descriptors.
//!
//! A [`LocalResource`] is one entry of the local registry: either a map
//! region (a single `.obf` file) or a voice pack (a `.voice` directory).
//! The two variants share identity fields; variant-specific data lives on
//! the variant itself and is reached by matching, not downcasting.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::ResourceError;
use super::types::ResourceType;

/// Metadata obtained by probing a map file's section headers.
///
/// The manager treats this as opaque: it is produced by the map-file probe
/// collaborator, stored on the registry entry, and handed back to callers
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFileInfo {
    /// Format version of the map file.
    pub version: i32,
    /// Creation timestamp of the map file, in ms since the Unix epoch.
    pub creation_timestamp: u64,
    /// Names of the sections found in the file.
    pub section_names: Vec<String>,
}

/// Advisory flag asserting that a map file is about to be deleted.
///
/// Long-running readers of the map file are expected to observe the flag and
/// release their handles when it transitions to `true`. Engaging the lock
/// does not block readers already in flight; deletion proceeds regardless.
///
/// Clones share the underlying flag, so registry snapshots taken before the
/// transition still observe it.
#[derive(Debug, Clone, Default)]
pub struct RemovalLock {
    flag: Arc<AtomicBool>,
}

impl RemovalLock {
    /// Create a new, disengaged lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the map file for removal.
    pub fn engage(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Check whether removal has been announced.
    pub fn is_active(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A resource present in local storage.
///
/// Identity is the `name`: equality and hashing consider nothing else, so a
/// rescanned entry compares equal to the entry it replaces even when its
/// timestamp moved.
///
/// # Example
///
/// ```
/// use mapvault::resource::{LocalResource, ResourceType};
///
/// let pack = LocalResource::voice_pack("English.voice", 2000, 512, "/maps/english.voice")
///     .unwrap();
///
/// // Names are normalized to lowercase.
/// assert_eq!(pack.name(), "english.voice");
/// assert_eq!(pack.resource_type(), ResourceType::VoicePack);
/// ```
#[derive(Debug, Clone)]
pub enum LocalResource {
    /// A map region: one `.obf` file in a storage root.
    MapRegion {
        /// Unique registry key (lowercase).
        name: String,
        /// Modification time in ms since the Unix epoch.
        timestamp: u64,
        /// On-disk size of the map file in bytes.
        content_size: u64,
        /// Absolute path to the map file.
        local_path: PathBuf,
        /// Probe result for the map file.
        map_info: MapFileInfo,
        /// Advisory removal flag shared with readers of the file.
        removal_lock: RemovalLock,
    },

    /// A voice pack: a `.voice` directory with a `_config.p` descriptor.
    VoicePack {
        /// Unique registry key (lowercase).
        name: String,
        /// Timestamp recorded in the `.timestamp` sidecar, in ms.
        timestamp: u64,
        /// Content size recorded in the `.size` sidecar, in bytes.
        content_size: u64,
        /// Absolute path to the pack directory.
        local_path: PathBuf,
    },
}

impl LocalResource {
    /// Create a map-region descriptor.
    ///
    /// Rejects an empty name and a relative path. The name is normalized to
    /// lowercase.
    pub fn map_region(
        name: impl Into<String>,
        timestamp: u64,
        content_size: u64,
        local_path: impl Into<PathBuf>,
        map_info: MapFileInfo,
    ) -> Result<Self, ResourceError> {
        let name = validated_name(name)?;
        let local_path = validated_path(local_path)?;
        Ok(Self::MapRegion {
            name,
            timestamp,
            content_size,
            local_path,
            map_info,
            removal_lock: RemovalLock::new(),
        })
    }

    /// Create a voice-pack descriptor.
    ///
    /// Rejects an empty name and a relative path. The name is normalized to
    /// lowercase.
    pub fn voice_pack(
        name: impl Into<String>,
        timestamp: u64,
        content_size: u64,
        local_path: impl Into<PathBuf>,
    ) -> Result<Self, ResourceError> {
        let name = validated_name(name)?;
        let local_path = validated_path(local_path)?;
        Ok(Self::VoicePack {
            name,
            timestamp,
            content_size,
            local_path,
        })
    }

    /// Registry key of this resource.
    pub fn name(&self) -> &str {
        match self {
            Self::MapRegion { name, .. } | Self::VoicePack { name, .. } => name,
        }
    }

    /// Kind of this resource.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::MapRegion { .. } => ResourceType::MapRegion,
            Self::VoicePack { .. } => ResourceType::VoicePack,
        }
    }

    /// Timestamp in ms since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::MapRegion { timestamp, .. } | Self::VoicePack { timestamp, .. } => *timestamp,
        }
    }

    /// Content size in bytes.
    pub fn content_size(&self) -> u64 {
        match self {
            Self::MapRegion { content_size, .. } | Self::VoicePack { content_size, .. } => {
                *content_size
            }
        }
    }

    /// Absolute path of the file or directory backing this resource.
    pub fn local_path(&self) -> &Path {
        match self {
            Self::MapRegion { local_path, .. } | Self::VoicePack { local_path, .. } => local_path,
        }
    }

    /// Probe metadata, for map regions.
    pub fn map_info(&self) -> Option<&MapFileInfo> {
        match self {
            Self::MapRegion { map_info, .. } => Some(map_info),
            Self::VoicePack { .. } => None,
        }
    }

    /// Removal lock, for map regions.
    pub fn removal_lock(&self) -> Option<&RemovalLock> {
        match self {
            Self::MapRegion { removal_lock, .. } => Some(removal_lock),
            Self::VoicePack { .. } => None,
        }
    }
}

impl PartialEq for LocalResource {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for LocalResource {}

impl Hash for LocalResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

pub(crate) fn validated_name(name: impl Into<String>) -> Result<String, ResourceError> {
    let name = name.into();
    if name.is_empty() {
        return Err(ResourceError::EmptyName);
    }
    Ok(name.to_lowercase())
}

pub(crate) fn validated_path(path: impl Into<PathBuf>) -> Result<PathBuf, ResourceError> {
    let path = path.into();
    if !path.is_absolute() {
        return Err(ResourceError::PathNotAbsolute(path));
    }
    Ok(path)
}
