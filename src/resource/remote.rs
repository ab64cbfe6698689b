//! Resources advertised by the remote repository index.

use std::hash::{Hash, Hasher};

use super::error::ResourceError;
use super::local::validated_name;
use super::types::ResourceType;

/// One entry of the remote catalog.
///
/// Remote entries are replaced wholesale on every successful catalog refresh;
/// they carry no local state.
#[derive(Debug, Clone)]
pub struct RemoteResource {
    /// Unique registry key (lowercase, trailing `.zip` stripped).
    pub name: String,
    /// Kind of the resource.
    pub resource_type: ResourceType,
    /// Publication timestamp in ms since the Unix epoch.
    pub timestamp: u64,
    /// Size of the installed content in bytes.
    pub content_size: u64,
    /// Size of the compressed container in bytes.
    pub container_size: u64,
    /// URL the container can be downloaded from.
    pub download_url: String,
}

impl RemoteResource {
    /// Create a remote descriptor.
    ///
    /// Rejects an empty name, a non-storable type, and an empty download URL.
    /// The name is normalized to lowercase.
    pub fn new(
        name: impl Into<String>,
        resource_type: ResourceType,
        timestamp: u64,
        content_size: u64,
        container_size: u64,
        download_url: impl Into<String>,
    ) -> Result<Self, ResourceError> {
        let name = validated_name(name)?;
        if !resource_type.is_known() {
            return Err(ResourceError::UnstorableType(resource_type));
        }
        let download_url = download_url.into();
        if download_url.is_empty() {
            return Err(ResourceError::EmptyDownloadUrl);
        }
        Ok(Self {
            name,
            resource_type,
            timestamp,
            content_size,
            container_size,
            download_url,
        })
    }
}

impl PartialEq for RemoteResource {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RemoteResource {}

impl Hash for RemoteResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_name() {
        let res = RemoteResource::new(
            "Germany.obf",
            ResourceType::MapRegion,
            1000,
            200,
            50,
            "https://repo.example.com/download.php?file=Germany.obf.zip",
        )
        .unwrap();

        assert_eq!(res.name, "germany.obf");
        assert_eq!(res.timestamp, 1000);
        assert_eq!(res.content_size, 200);
        assert_eq!(res.container_size, 50);
    }

    #[test]
    fn test_rejects_unknown_type() {
        let err = RemoteResource::new("x", ResourceType::Unknown, 0, 0, 0, "http://u").unwrap_err();
        assert_eq!(err, ResourceError::UnstorableType(ResourceType::Unknown));
    }

    #[test]
    fn test_rejects_empty_url() {
        let err = RemoteResource::new("x", ResourceType::MapRegion, 0, 0, 0, "").unwrap_err();
        assert_eq!(err, ResourceError::EmptyDownloadUrl);
    }

    #[test]
    fn test_equality_is_by_name_only() {
        let a = RemoteResource::new("x", ResourceType::MapRegion, 1, 1, 1, "http://a").unwrap();
        let b = RemoteResource::new("x", ResourceType::VoicePack, 2, 2, 2, "http://b").unwrap();
        assert_eq!(a, b);
    }
}
