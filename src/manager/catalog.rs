//! Remote repository index client.
//!
//! Fetches `<base_url>/get_indexes.php` and parses the XML body into a fresh
//! name-to-resource map. The parser is schema-lax: any start element carrying
//! the full attribute set (`type`, `name`, `timestamp`, `containerSize`,
//! `contentSize`) counts as an entry, whatever its tag name. Per-element
//! problems skip that element; an XML-level error fails the whole refresh so
//! the registry keeps its previous index.

use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use super::error::{ManagerError, ManagerResult};
use super::traits::WebClient;
use crate::resource::{RemoteResource, ResourceType};

/// Characters escaped in the `file=` query value. Unreserved characters
/// (alphanumerics and `-._~`) pass through.
const FILE_QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Download the repository index and parse it.
pub(crate) fn fetch_catalog<W: WebClient + ?Sized>(
    web: &W,
    base_url: &str,
) -> ManagerResult<HashMap<String, RemoteResource>> {
    let index_url = format!("{}/get_indexes.php", base_url);
    let body = web.download_bytes(&index_url)?;
    if body.is_empty() {
        return Err(ManagerError::DownloadFailed {
            url: index_url,
            reason: "empty response body".to_string(),
        });
    }
    parse_catalog(&body, base_url, &index_url)
}

fn parse_catalog(
    body: &[u8],
    base_url: &str,
    index_url: &str,
) -> ManagerResult<HashMap<String, RemoteResource>> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut resources = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                let parsed = parse_element(&element, base_url).map_err(|reason| {
                    ManagerError::CatalogParseFailed {
                        url: index_url.to_string(),
                        reason,
                    }
                })?;
                if let Some(resource) = parsed {
                    resources.insert(resource.name.clone(), resource);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ManagerError::CatalogParseFailed {
                    url: index_url.to_string(),
                    reason: e.to_string(),
                })
            }
        }
        buf.clear();
    }

    Ok(resources)
}

/// Parse one element into a remote resource.
///
/// `Ok(None)` skips the element (missing attributes, unknown type, bad
/// numbers); `Err` reports an XML-level problem that aborts the refresh.
fn parse_element(element: &BytesStart<'_>, base_url: &str) -> Result<Option<RemoteResource>, String> {
    let mut type_attr = None;
    let mut name_attr = None;
    let mut timestamp_attr = None;
    let mut container_size_attr = None;
    let mut content_size_attr = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr
            .unescape_value()
            .map_err(|e| e.to_string())?
            .into_owned();
        match attr.key.as_ref() {
            b"type" => type_attr = Some(value),
            b"name" => name_attr = Some(value),
            b"timestamp" => timestamp_attr = Some(value),
            b"containerSize" => container_size_attr = Some(value),
            b"contentSize" => content_size_attr = Some(value),
            _ => {}
        }
    }

    // Elements without the full attribute set are structural markup, not
    // entries.
    let (Some(type_value), Some(name), Some(timestamp), Some(container_size), Some(content_size)) = (
        type_attr,
        name_attr,
        timestamp_attr,
        container_size_attr,
        content_size_attr,
    ) else {
        return Ok(None);
    };

    let resource_type = ResourceType::from_catalog_tag(&type_value);
    if !resource_type.is_known() {
        warn!(name = %name, type_tag = %type_value, "skipping catalog entry of unknown type");
        return Ok(None);
    }

    let Some(timestamp) = parse_u64(&timestamp, "timestamp", &name) else {
        return Ok(None);
    };
    let Some(container_size) = parse_u64(&container_size, "containerSize", &name) else {
        return Ok(None);
    };
    let Some(content_size) = parse_u64(&content_size, "contentSize", &name) else {
        return Ok(None);
    };

    let download_url = format!(
        "{}/download.php?file={}",
        base_url,
        utf8_percent_encode(&name, FILE_QUERY_SET)
    );
    let key = name.strip_suffix(".zip").unwrap_or(&name);

    match RemoteResource::new(
        key,
        resource_type,
        timestamp,
        content_size,
        container_size,
        download_url,
    ) {
        Ok(resource) => Ok(Some(resource)),
        Err(e) => {
            warn!(name = %name, error = %e, "skipping malformed catalog entry");
            Ok(None)
        }
    }
}

fn parse_u64(value: &str, attribute: &str, name: &str) -> Option<u64> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(name, attribute, value, "skipping catalog entry with invalid number");
            None
        }
    }
}
