//! Resource kind tags shared by local and remote descriptors.

use std::fmt;

/// Kind of a managed resource.
///
/// `Unknown` exists only while parsing a catalog `type` attribute; it is
/// rejected by every constructor and never stored in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// A binary map file covering one geographic region.
    MapRegion,
    /// A directory of voice prompts plus a `_config.p` descriptor.
    VoicePack,
    /// Parse-time sentinel for unrecognized catalog entries.
    Unknown,
}

impl ResourceType {
    /// Map a catalog `type` attribute value to a resource type.
    ///
    /// Anything other than `map` or `voice` yields [`ResourceType::Unknown`],
    /// which callers are expected to skip.
    ///
    /// # Example
    ///
    /// ```
    /// use mapvault::resource::ResourceType;
    ///
    /// assert_eq!(ResourceType::from_catalog_tag("map"), ResourceType::MapRegion);
    /// assert_eq!(ResourceType::from_catalog_tag("voice"), ResourceType::VoicePack);
    /// assert_eq!(ResourceType::from_catalog_tag("font"), ResourceType::Unknown);
    /// ```
    pub fn from_catalog_tag(tag: &str) -> Self {
        match tag {
            "map" => Self::MapRegion,
            "voice" => Self::VoicePack,
            _ => Self::Unknown,
        }
    }

    /// Check whether this is a storable resource type.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::MapRegion => "map",
            Self::VoicePack => "voice",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", tag)
    }
}
