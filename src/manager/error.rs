//! Error types for the Resources Manager.

use std::io;
use std::path::PathBuf;

use crate::resource::ResourceError;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors that can occur during resource management operations.
#[derive(Debug)]
pub enum ManagerError {
    /// Resource not found in the relevant registry.
    NotFound { name: String },

    /// A resource with this name is already installed.
    AlreadyInstalled { name: String },

    /// Network or HTTP status problem while downloading.
    DownloadFailed { url: String, reason: String },

    /// Download cancelled through the progress callback.
    DownloadAborted { url: String },

    /// Archive not listable or missing its required marker entry.
    ArchiveMalformed { path: PathBuf, reason: String },

    /// The map-file probe rejected a file.
    ProbeFailed { path: PathBuf, reason: String },

    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to delete a file or directory.
    RemoveFailed { path: PathBuf, source: io::Error },

    /// Repository index was not parseable as XML.
    CatalogParseFailed { url: String, reason: String },

    /// Failed to watch a storage path for changes.
    WatchFailed { path: PathBuf, reason: String },

    /// Invalid configuration.
    InvalidConfig(String),

    /// Malformed resource descriptor.
    Resource(ResourceError),
}

impl std::fmt::Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "resource not found: {}", name),
            Self::AlreadyInstalled { name } => {
                write!(f, "resource '{}' is already installed", name)
            }
            Self::DownloadFailed { url, reason } => {
                write!(f, "failed to download {}: {}", url, reason)
            }
            Self::DownloadAborted { url } => {
                write!(f, "download of {} was cancelled", url)
            }
            Self::ArchiveMalformed { path, reason } => {
                write!(f, "malformed archive {}: {}", path.display(), reason)
            }
            Self::ProbeFailed { path, reason } => {
                write!(f, "failed to probe map file {}: {}", path.display(), reason)
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::RemoveFailed { path, source } => {
                write!(f, "failed to remove {}: {}", path.display(), source)
            }
            Self::CatalogParseFailed { url, reason } => {
                write!(f, "failed to parse repository index from {}: {}", url, reason)
            }
            Self::WatchFailed { path, reason } => {
                write!(f, "failed to watch {}: {}", path.display(), reason)
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Resource(e) => write!(f, "invalid resource: {}", e),
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. }
            | Self::WriteFailed { source, .. }
            | Self::CreateDirFailed { source, .. }
            | Self::RemoveFailed { source, .. } => Some(source),
            Self::Resource(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResourceError> for ManagerError {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ManagerError::NotFound {
            name: "germany.obf".to_string(),
        };
        assert_eq!(err.to_string(), "resource not found: germany.obf");
    }

    #[test]
    fn test_already_installed_display() {
        let err = ManagerError::AlreadyInstalled {
            name: "english.voice".to_string(),
        };
        assert!(err.to_string().contains("already installed"));
        assert!(err.to_string().contains("english.voice"));
    }

    #[test]
    fn test_io_error_source() {
        let err = ManagerError::ReadFailed {
            path: PathBuf::from("/maps/a.obf"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_resource_error() {
        let err: ManagerError = ResourceError::EmptyName.into();
        assert!(matches!(err, ManagerError::Resource(_)));
    }
}
