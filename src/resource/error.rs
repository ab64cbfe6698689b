//! Validation errors for resource descriptors.

use std::path::PathBuf;

use super::types::ResourceType;

/// Errors rejected by resource constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Resource name is empty.
    EmptyName,

    /// Local path is not absolute.
    PathNotAbsolute(PathBuf),

    /// Resource type is not storable (only `Unknown` today).
    UnstorableType(ResourceType),

    /// Remote resource has no download URL.
    EmptyDownloadUrl,
}

impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "resource name must not be empty"),
            Self::PathNotAbsolute(path) => {
                write!(f, "resource path must be absolute: {}", path.display())
            }
            Self::UnstorableType(resource_type) => {
                write!(f, "resource type '{}' cannot be stored", resource_type)
            }
            Self::EmptyDownloadUrl => write!(f, "remote resource must have a download URL"),
        }
    }
}

impl std::error::Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ResourceError::EmptyName.to_string(),
            "resource name must not be empty"
        );

        let err = ResourceError::PathNotAbsolute(PathBuf::from("relative/path"));
        assert!(err.to_string().contains("relative/path"));

        let err = ResourceError::UnstorableType(ResourceType::Unknown);
        assert!(err.to_string().contains("unknown"));
    }
}
