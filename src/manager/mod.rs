//! Resources Manager: lifecycle of map bundles and voice packs.
//!
//! The [`ResourcesManager`] keeps two registries — resources present in
//! local storage and resources advertised by the remote repository — and
//! exposes the operations the UI consumes: listing, catalog refresh,
//! update comparison, install, update, and uninstall.
//!
//! # Architecture
//!
//! ```text
//! ResourcesManager (façade)
//!         │
//!         ├── ResourceRegistry (two RwLock'd maps, snapshot reads)
//!         │
//!         ├── scanner  (storage roots → LocalResource map)
//!         ├── catalog  (get_indexes.php → RemoteResource map)
//!         ├── installer (archive validation, extraction, teardown)
//!         │
//!         ├── MapFileProbe (trait)   — map metadata, external subsystem
//!         ├── ArchiveReader (trait)  — ZipArchiveReader provided
//!         └── WebClient (trait)      — HttpWebClient provided
//! ```
//!
//! Mutating operations run on the calling thread and block on I/O; readers
//! are never blocked for longer than a map clone. The optional
//! [`StorageWatcher`] rescans the storage roots when something else touches
//! them.

mod archive;
mod catalog;
mod config;
mod error;
mod installer;
mod registry;
mod scanner;
mod traits;
mod watcher;
mod web;

pub use archive::ZipArchiveReader;
pub use config::{ManagerConfig, DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_WATCH_DEBOUNCE};
pub use error::{ManagerError, ManagerResult};
pub use traits::{ArchiveItem, ArchiveReader, MapFileProbe, ProgressCallback, WebClient};
pub use watcher::StorageWatcher;
pub use web::HttpWebClient;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::resource::{LocalResource, RemoteResource, ResourceError, ResourceType};
use registry::ResourceRegistry;

/// Manages the set of installed resources and their remote counterparts.
///
/// Generic over the three external collaborators: [`MapFileProbe`],
/// [`ArchiveReader`], and [`WebClient`].
pub struct ResourcesManager<P, A, W> {
    config: ManagerConfig,
    probe: P,
    archive: A,
    web: W,
    registry: ResourceRegistry,
}

impl<P, A, W> ResourcesManager<P, A, W>
where
    P: MapFileProbe,
    A: ArchiveReader,
    W: WebClient,
{
    /// Create a manager with the given configuration and collaborators.
    ///
    /// Validates the configuration but performs no I/O; call [`rescan`]
    /// and [`refresh_catalog`] to populate the registries.
    ///
    /// [`rescan`]: Self::rescan
    /// [`refresh_catalog`]: Self::refresh_catalog
    pub fn new(config: ManagerConfig, probe: P, archive: A, web: W) -> ManagerResult<Self> {
        Ok(Self {
            config: config.validated()?,
            probe,
            archive,
            web,
            registry: ResourceRegistry::new(),
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ---- local registry -------------------------------------------------

    /// Rebuild the local registry from the storage roots.
    ///
    /// The whole scan runs under the local writer lock; on any failure the
    /// previous registry state is kept.
    pub fn rescan(&self) -> ManagerResult<()> {
        let mut local = self.registry.local_write();
        let scanned = scanner::scan_all(
            &self.probe,
            &self.config.local_storage_path,
            &self.config.extra_storage_paths,
        )?;
        debug!(count = scanned.len(), "local storage rescan complete");
        *local = scanned;
        Ok(())
    }

    /// Snapshot of all locally installed resources.
    pub fn local_resources(&self) -> Vec<LocalResource> {
        self.registry.local_snapshot()
    }

    /// Look up one locally installed resource.
    pub fn local_resource(&self, name: &str) -> Option<LocalResource> {
        self.registry.local_get(&name.to_lowercase())
    }

    /// Check whether a resource is installed.
    pub fn is_installed(&self, name: &str) -> bool {
        self.registry.is_installed(&name.to_lowercase())
    }

    // ---- remote registry ------------------------------------------------

    /// Fetch the repository index and replace the remote registry.
    ///
    /// The download and parse happen before the remote writer lock is taken,
    /// so readers only wait for the map swap. On failure the previous index
    /// is kept in full.
    pub fn refresh_catalog(&self) -> ManagerResult<()> {
        let index = catalog::fetch_catalog(&self.web, &self.config.repository_base_url)?;
        debug!(count = index.len(), "repository index refreshed");
        self.registry.replace_remote(index);
        Ok(())
    }

    /// Snapshot of the remote repository index.
    pub fn remote_resources(&self) -> Vec<RemoteResource> {
        self.registry.remote_snapshot()
    }

    /// Look up one remote resource.
    pub fn remote_resource(&self, name: &str) -> Option<RemoteResource> {
        self.registry.remote_get(&name.to_lowercase())
    }

    // ---- install / uninstall -------------------------------------------

    /// Install a resource from an archive file on disk.
    ///
    /// With `name` of `None` the resource name is derived from the file name
    /// minus a `.zip` suffix. Fails if a resource of that name is already
    /// installed.
    pub fn install_from_file(
        &self,
        name: Option<&str>,
        file_path: &Path,
        resource_type: ResourceType,
    ) -> ManagerResult<()> {
        let name = self.resolve_name(name, file_path)?;

        let mut local = self.registry.local_write();
        if local.contains_key(&name) {
            return Err(ManagerError::AlreadyInstalled { name });
        }

        let resource = self.install_variant(&name, file_path, resource_type)?;
        local.insert(name, resource);
        Ok(())
    }

    /// Download a resource container from the repository and install it.
    ///
    /// The container is staged in the temporary directory and removed again
    /// on every exit path. The progress callback can cancel the download by
    /// returning `false`.
    pub fn install_from_repository(
        &self,
        name: &str,
        progress: Option<&ProgressCallback>,
    ) -> ManagerResult<()> {
        let name = name.to_lowercase();
        if self.registry.is_installed(&name) {
            return Err(ManagerError::AlreadyInstalled { name });
        }
        let remote = self
            .registry
            .remote_get(&name)
            .ok_or_else(|| ManagerError::NotFound { name: name.clone() })?;

        let temp_path = self.stage_container(&remote, progress)?;
        let result = self.install_from_file(Some(&name), &temp_path, remote.resource_type);
        remove_temp_file(&temp_path);
        result
    }

    /// Uninstall a resource: delete its backing file or directory and drop
    /// the registry entry.
    ///
    /// The registry entry survives a failed filesystem deletion, so the
    /// resource stays visible and the operation can be retried.
    pub fn uninstall(&self, name: &str) -> ManagerResult<()> {
        let name = name.to_lowercase();
        let mut local = self.registry.local_write();
        let resource = local
            .get(&name)
            .ok_or_else(|| ManagerError::NotFound { name: name.clone() })?;

        installer::remove_from_disk(resource)?;
        local.remove(&name);
        Ok(())
    }

    // ---- update ---------------------------------------------------------

    /// Replace an installed resource with the contents of an archive file.
    ///
    /// The resource must exist; it keeps its type. Uninstall and reinstall
    /// happen under one writer lock. If the install phase fails after the
    /// old version was removed, the resource ends up absent — there is no
    /// rollback to the previous version.
    pub fn update_from_file(&self, name: Option<&str>, file_path: &Path) -> ManagerResult<()> {
        let name = self.resolve_name(name, file_path)?;

        let mut local = self.registry.local_write();
        let existing = local
            .get(&name)
            .ok_or_else(|| ManagerError::NotFound { name: name.clone() })?;
        let resource_type = existing.resource_type();

        installer::remove_from_disk(existing)?;
        local.remove(&name);

        let resource = self.install_variant(&name, file_path, resource_type)?;
        local.insert(name, resource);
        Ok(())
    }

    /// Download the latest container of an installed resource and update it.
    pub fn update_from_repository(
        &self,
        name: &str,
        progress: Option<&ProgressCallback>,
    ) -> ManagerResult<()> {
        let name = name.to_lowercase();
        let remote = self
            .registry
            .remote_get(&name)
            .ok_or_else(|| ManagerError::NotFound { name: name.clone() })?;

        let temp_path = self.stage_container(&remote, progress)?;
        let result = self.update_from_file(Some(&name), &temp_path);
        remove_temp_file(&temp_path);
        result
    }

    /// Check whether the repository carries a newer version of a resource.
    ///
    /// `false` when either side is absent.
    pub fn update_available_for(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        let Some(remote) = self.registry.remote_get(&name) else {
            return false;
        };
        let Some(local) = self.registry.local_get(&name) else {
            return false;
        };
        local.timestamp() < remote.timestamp
    }

    /// Names of all installed resources the repository has newer versions of.
    pub fn available_updates(&self) -> Vec<String> {
        let mut updates = Vec::new();
        for local in self.registry.local_snapshot() {
            let Some(remote) = self.registry.remote_get(local.name()) else {
                continue;
            };
            if local.timestamp() < remote.timestamp {
                updates.push(local.name().to_string());
            }
        }
        updates
    }

    // ---- helpers --------------------------------------------------------

    fn resolve_name(&self, name: Option<&str>, file_path: &Path) -> ManagerResult<String> {
        match name {
            Some(name) => Ok(name.to_lowercase()),
            None => installer::guessed_name(file_path)
                .map(|n| n.to_lowercase())
                .ok_or_else(|| ManagerError::ArchiveMalformed {
                    path: file_path.to_path_buf(),
                    reason: "cannot derive a resource name from the path".to_string(),
                }),
        }
    }

    fn install_variant(
        &self,
        name: &str,
        file_path: &Path,
        resource_type: ResourceType,
    ) -> ManagerResult<LocalResource> {
        match resource_type {
            ResourceType::MapRegion => installer::install_map_region(
                &self.probe,
                &self.archive,
                &self.config.local_storage_path,
                name,
                file_path,
            ),
            ResourceType::VoicePack => installer::install_voice_pack(
                &self.archive,
                &self.config.local_storage_path,
                name,
                file_path,
            ),
            ResourceType::Unknown => Err(ManagerError::Resource(ResourceError::UnstorableType(
                ResourceType::Unknown,
            ))),
        }
    }

    /// Download a remote container to a uniquely named temp file.
    fn stage_container(
        &self,
        remote: &RemoteResource,
        progress: Option<&ProgressCallback>,
    ) -> ManagerResult<std::path::PathBuf> {
        fs::create_dir_all(&self.config.local_temporary_path).map_err(|e| {
            ManagerError::CreateDirFailed {
                path: self.config.local_temporary_path.clone(),
                source: e,
            }
        })?;

        let temp_path = installer::temp_download_path(&self.config.local_temporary_path, &remote.name);
        match self
            .web
            .download_to_file(&remote.download_url, &temp_path, progress)
        {
            Ok(_) => Ok(temp_path),
            Err(e) => {
                remove_temp_file(&temp_path);
                Err(e)
            }
        }
    }
}

impl<P, A, W> ResourcesManager<P, A, W>
where
    P: MapFileProbe + 'static,
    A: ArchiveReader + 'static,
    W: WebClient + 'static,
{
    /// Watch the extra storage roots and rescan on changes.
    ///
    /// The watcher holds only a weak reference; dropping the last `Arc` to
    /// the manager quiesces it. Events are coalesced per the configured
    /// debounce window. The primary storage path is not watched: the manager
    /// itself is the only writer there.
    pub fn start_watching(self: &Arc<Self>) -> ManagerResult<StorageWatcher> {
        let manager = Arc::downgrade(self);
        StorageWatcher::spawn(
            &self.config.extra_storage_paths,
            self.config.watch_debounce,
            move || {
                let Some(manager) = manager.upgrade() else {
                    return;
                };
                if let Err(e) = manager.rescan() {
                    warn!(error = %e, "watcher-triggered rescan failed");
                }
            },
        )
    }
}

fn remove_temp_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to delete temporary download");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MapFileInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StubProbe;

    impl MapFileProbe for StubProbe {
        fn probe(&self, path: &Path) -> ManagerResult<MapFileInfo> {
            let content = fs::read(path).map_err(|e| ManagerError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
            if content.starts_with(b"corrupt") {
                return Err(ManagerError::ProbeFailed {
                    path: path.to_path_buf(),
                    reason: "bad header".to_string(),
                });
            }
            Ok(MapFileInfo {
                version: 2,
                creation_timestamp: 7,
                section_names: vec!["routing".to_string()],
            })
        }
    }

    /// In-memory archive keyed by entry name; ignores the archive path.
    struct StubArchive {
        entries: Vec<(ArchiveItem, Vec<u8>)>,
    }

    impl StubArchive {
        fn map_region(data: &[u8]) -> Self {
            Self::with_entries(&[("region.obf", 0, data)])
        }

        fn voice_pack(modified: u64) -> Self {
            Self::with_entries(&[("_config.p", modified, b"cfg"), ("en.mp3", 0, b"audio")])
        }

        fn with_entries(entries: &[(&str, u64, &[u8])]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(name, modified, data)| {
                        (
                            ArchiveItem {
                                name: name.to_string(),
                                size: data.len() as u64,
                                modified: *modified,
                            },
                            data.to_vec(),
                        )
                    })
                    .collect(),
            }
        }
    }

    impl ArchiveReader for StubArchive {
        fn list_items(&self, _archive: &Path) -> ManagerResult<Vec<ArchiveItem>> {
            Ok(self.entries.iter().map(|(item, _)| item.clone()).collect())
        }

        fn extract_item(&self, archive: &Path, item_name: &str, dest: &Path) -> ManagerResult<u64> {
            let (_, data) = self
                .entries
                .iter()
                .find(|(item, _)| item.name == item_name)
                .ok_or_else(|| ManagerError::ArchiveMalformed {
                    path: archive.to_path_buf(),
                    reason: "no such entry".to_string(),
                })?;
            fs::write(dest, data).map_err(|e| ManagerError::WriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })?;
            Ok(data.len() as u64)
        }

        fn extract_all(&self, _archive: &Path, dest_dir: &Path) -> ManagerResult<u64> {
            fs::create_dir_all(dest_dir).map_err(|e| ManagerError::CreateDirFailed {
                path: dest_dir.to_path_buf(),
                source: e,
            })?;
            let mut total = 0;
            for (item, data) in &self.entries {
                fs::write(dest_dir.join(&item.name), data).map_err(|e| {
                    ManagerError::WriteFailed {
                        path: dest_dir.join(&item.name),
                        source: e,
                    }
                })?;
                total += data.len() as u64;
            }
            Ok(total)
        }
    }

    #[derive(Default)]
    struct StubWeb {
        catalog_xml: Vec<u8>,
        /// Served for the second and later catalog fetches, when set.
        second_catalog_xml: Option<Vec<u8>>,
        catalog_calls: AtomicUsize,
        container: Vec<u8>,
        fail_download: bool,
    }

    impl WebClient for StubWeb {
        fn download_bytes(&self, _url: &str) -> ManagerResult<Vec<u8>> {
            let call = self.catalog_calls.fetch_add(1, Ordering::SeqCst);
            if call > 0 {
                if let Some(body) = &self.second_catalog_xml {
                    return Ok(body.clone());
                }
            }
            Ok(self.catalog_xml.clone())
        }

        fn download_to_file(
            &self,
            url: &str,
            dest: &Path,
            progress: Option<&ProgressCallback>,
        ) -> ManagerResult<u64> {
            if self.fail_download {
                return Err(ManagerError::DownloadFailed {
                    url: url.to_string(),
                    reason: "stub failure".to_string(),
                });
            }
            if let Some(cb) = progress {
                if !cb(self.container.len() as u64, self.container.len() as u64) {
                    return Err(ManagerError::DownloadAborted {
                        url: url.to_string(),
                    });
                }
            }
            fs::write(dest, &self.container).map_err(|e| ManagerError::WriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })?;
            Ok(self.container.len() as u64)
        }
    }

    struct Fixture {
        storage: TempDir,
        temp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                storage: TempDir::new().unwrap(),
                temp: TempDir::new().unwrap(),
            }
        }

        fn config(&self) -> ManagerConfig {
            ManagerConfig::new(
                self.storage.path(),
                self.temp.path(),
                "https://repo.example.com",
            )
        }

        fn manager(
            &self,
            archive: StubArchive,
            web: StubWeb,
        ) -> ResourcesManager<StubProbe, StubArchive, StubWeb> {
            ResourcesManager::new(self.config(), StubProbe, archive, web).unwrap()
        }

        fn temp_files(&self) -> usize {
            fs::read_dir(self.temp.path()).map(|d| d.count()).unwrap_or(0)
        }
    }

    fn catalog_xml(name: &str, type_tag: &str, timestamp: u64) -> Vec<u8> {
        format!(
            r#"<index><r type="{}" name="{}" timestamp="{}" containerSize="10" contentSize="20"/></index>"#,
            type_tag, name, timestamp
        )
        .into_bytes()
    }

    #[test]
    fn test_new_rejects_relative_storage_path() {
        let result = ResourcesManager::new(
            ManagerConfig::new("relative", "/tmp", "https://repo.example.com"),
            StubProbe,
            StubArchive::map_region(b"x"),
            StubWeb::default(),
        );
        assert!(matches!(result, Err(ManagerError::InvalidConfig(_))));
    }

    #[test]
    fn test_install_from_file_map_region() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"obf-data"), StubWeb::default());

        manager
            .install_from_file(None, Path::new("/tmp/Germany.obf.zip"), ResourceType::MapRegion)
            .unwrap();

        assert!(manager.is_installed("germany.obf"));
        let resource = manager.local_resource("germany.obf").unwrap();
        assert_eq!(resource.resource_type(), ResourceType::MapRegion);
        assert_eq!(resource.content_size(), 8);
        assert!(fixture.storage.path().join("germany.obf").is_file());
    }

    #[test]
    fn test_install_duplicate_fails_without_touching_disk() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"obf-data"), StubWeb::default());
        manager
            .install_from_file(Some("x.obf"), Path::new("/tmp/x.obf.zip"), ResourceType::MapRegion)
            .unwrap();
        let mtime_before = fs::metadata(fixture.storage.path().join("x.obf"))
            .unwrap()
            .modified()
            .unwrap();

        let result = manager.install_from_file(
            Some("x.obf"),
            Path::new("/tmp/x.obf.zip"),
            ResourceType::MapRegion,
        );

        assert!(matches!(result, Err(ManagerError::AlreadyInstalled { .. })));
        let mtime_after = fs::metadata(fixture.storage.path().join("x.obf"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(mtime_before, mtime_after);
    }

    #[test]
    fn test_install_voice_pack_from_file() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::voice_pack(2000), StubWeb::default());

        manager
            .install_from_file(
                Some("english.voice"),
                Path::new("/tmp/english.voice.zip"),
                ResourceType::VoicePack,
            )
            .unwrap();

        let resource = manager.local_resource("english.voice").unwrap();
        assert_eq!(resource.timestamp(), 2000);
        assert!(fixture
            .storage
            .path()
            .join("english.voice/_config.p")
            .is_file());
    }

    #[test]
    fn test_install_unknown_type_fails() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"x"), StubWeb::default());

        let result =
            manager.install_from_file(Some("x"), Path::new("/tmp/x.zip"), ResourceType::Unknown);
        assert!(matches!(result, Err(ManagerError::Resource(_))));
    }

    #[test]
    fn test_uninstall_map_region() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"x"), StubWeb::default());
        manager
            .install_from_file(Some("a.obf"), Path::new("/tmp/a.zip"), ResourceType::MapRegion)
            .unwrap();

        manager.uninstall("a.obf").unwrap();

        assert!(!manager.is_installed("a.obf"));
        assert!(manager.local_resource("a.obf").is_none());
        assert!(!fixture.storage.path().join("a.obf").exists());
    }

    #[test]
    fn test_uninstall_absent_is_not_found() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"x"), StubWeb::default());
        assert!(matches!(
            manager.uninstall("ghost.obf"),
            Err(ManagerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_uninstall_with_missing_file_still_evicts_entry() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"x"), StubWeb::default());
        manager
            .install_from_file(Some("a.obf"), Path::new("/tmp/a.zip"), ResourceType::MapRegion)
            .unwrap();
        fs::remove_file(fixture.storage.path().join("a.obf")).unwrap();

        manager.uninstall("a.obf").unwrap();
        assert!(!manager.is_installed("a.obf"));
    }

    #[test]
    fn test_refresh_catalog_and_lookup() {
        let fixture = Fixture::new();
        let web = StubWeb {
            catalog_xml: catalog_xml("Germany.obf.zip", "map", 1000),
            ..Default::default()
        };
        let manager = fixture.manager(StubArchive::map_region(b"x"), web);

        manager.refresh_catalog().unwrap();

        assert_eq!(manager.remote_resources().len(), 1);
        let remote = manager.remote_resource("germany.obf").unwrap();
        assert_eq!(remote.timestamp, 1000);
        assert!(remote.download_url.ends_with("file=Germany.obf.zip"));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_index() {
        let fixture = Fixture::new();
        let web = StubWeb {
            catalog_xml: catalog_xml("a.obf", "map", 1),
            second_catalog_xml: Some(b"<broken".to_vec()),
            ..Default::default()
        };
        let manager = fixture.manager(StubArchive::map_region(b"x"), web);

        manager.refresh_catalog().unwrap();
        assert_eq!(manager.remote_resources().len(), 1);

        assert!(manager.refresh_catalog().is_err());

        // The failed refresh did not disturb the previous index.
        assert_eq!(manager.remote_resources().len(), 1);
        assert_eq!(manager.remote_resource("a.obf").unwrap().timestamp, 1);
    }

    #[test]
    fn test_install_from_repository_cleans_temp() {
        let fixture = Fixture::new();
        let web = StubWeb {
            catalog_xml: catalog_xml("germany.obf.zip", "map", 1000),
            container: b"container-bytes".to_vec(),
            ..Default::default()
        };
        let manager = fixture.manager(StubArchive::map_region(b"obf-data"), web);
        manager.refresh_catalog().unwrap();

        manager.install_from_repository("germany.obf", None).unwrap();

        assert!(manager.is_installed("germany.obf"));
        assert_eq!(fixture.temp_files(), 0);
    }

    #[test]
    fn test_install_from_repository_absent_remote() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"x"), StubWeb::default());
        let result = manager.install_from_repository("ghost.obf", None);
        assert!(matches!(result, Err(ManagerError::NotFound { .. })));
    }

    #[test]
    fn test_install_from_repository_already_installed() {
        let fixture = Fixture::new();
        let web = StubWeb {
            catalog_xml: catalog_xml("a.obf.zip", "map", 1000),
            container: b"bytes".to_vec(),
            ..Default::default()
        };
        let manager = fixture.manager(StubArchive::map_region(b"x"), web);
        manager.refresh_catalog().unwrap();
        manager
            .install_from_file(Some("a.obf"), Path::new("/tmp/a.zip"), ResourceType::MapRegion)
            .unwrap();

        let result = manager.install_from_repository("a.obf", None);
        assert!(matches!(result, Err(ManagerError::AlreadyInstalled { .. })));
    }

    #[test]
    fn test_failed_download_cleans_temp() {
        let fixture = Fixture::new();
        let web = StubWeb {
            catalog_xml: catalog_xml("a.obf.zip", "map", 1000),
            fail_download: true,
            ..Default::default()
        };
        let manager = fixture.manager(StubArchive::map_region(b"x"), web);
        manager.refresh_catalog().unwrap();

        let result = manager.install_from_repository("a.obf", None);

        assert!(matches!(result, Err(ManagerError::DownloadFailed { .. })));
        assert_eq!(fixture.temp_files(), 0);
        assert!(!manager.is_installed("a.obf"));
    }

    #[test]
    fn test_progress_callback_can_abort() {
        let fixture = Fixture::new();
        let web = StubWeb {
            catalog_xml: catalog_xml("a.obf.zip", "map", 1000),
            container: b"bytes".to_vec(),
            ..Default::default()
        };
        let manager = fixture.manager(StubArchive::map_region(b"x"), web);
        manager.refresh_catalog().unwrap();

        let cancel: ProgressCallback = Box::new(|_, _| false);
        let result = manager.install_from_repository("a.obf", Some(&cancel));

        assert!(matches!(result, Err(ManagerError::DownloadAborted { .. })));
        assert!(!manager.is_installed("a.obf"));
        assert_eq!(fixture.temp_files(), 0);
    }

    #[test]
    fn test_update_from_file_requires_existing_entry() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"x"), StubWeb::default());
        let result = manager.update_from_file(Some("ghost.obf"), Path::new("/tmp/g.zip"));
        assert!(matches!(result, Err(ManagerError::NotFound { .. })));
    }

    #[test]
    fn test_update_from_file_replaces_content() {
        let fixture = Fixture::new();
        let manager = fixture.manager(StubArchive::map_region(b"new-longer-data"), StubWeb::default());
        // Seed the old version directly on disk and scan it in.
        fs::write(fixture.storage.path().join("a.obf"), b"old").unwrap();
        manager.rescan().unwrap();
        assert_eq!(manager.local_resource("a.obf").unwrap().content_size(), 3);

        manager
            .update_from_file(Some("a.obf"), Path::new("/tmp/a.zip"))
            .unwrap();

        assert_eq!(manager.local_resource("a.obf").unwrap().content_size(), 15);
        assert_eq!(
            fs::read(fixture.storage.path().join("a.obf")).unwrap(),
            b"new-longer-data"
        );
    }

    #[test]
    fn test_update_failure_leaves_resource_absent() {
        let fixture = Fixture::new();
        // The new container's map file is corrupt; the probe rejects it.
        let manager = fixture.manager(StubArchive::map_region(b"corrupt-data"), StubWeb::default());
        fs::write(fixture.storage.path().join("a.obf"), b"old").unwrap();
        manager.rescan().unwrap();

        let result = manager.update_from_file(Some("a.obf"), Path::new("/tmp/a.zip"));

        assert!(matches!(result, Err(ManagerError::ProbeFailed { .. })));
        assert!(!manager.is_installed("a.obf"));
        assert!(!fixture.storage.path().join("a.obf").exists());
    }

    #[test]
    fn test_update_availability_comparison() {
        let fixture = Fixture::new();
        let web = StubWeb {
            catalog_xml: catalog_xml("a.obf.zip", "map", 9_999_999_999_999),
            ..Default::default()
        };
        let manager = fixture.manager(StubArchive::map_region(b"x"), web);
        fs::write(fixture.storage.path().join("a.obf"), b"old").unwrap();
        fs::write(fixture.storage.path().join("b.obf"), b"not-remote").unwrap();
        manager.rescan().unwrap();
        manager.refresh_catalog().unwrap();

        assert!(manager.update_available_for("a.obf"));
        assert!(!manager.update_available_for("b.obf"));
        assert!(!manager.update_available_for("ghost.obf"));
        assert_eq!(manager.available_updates(), vec!["a.obf".to_string()]);
    }

    #[test]
    fn test_available_updates_empty_when_local_newer() {
        let fixture = Fixture::new();
        let web = StubWeb {
            catalog_xml: catalog_xml("a.obf.zip", "map", 1),
            ..Default::default()
        };
        let manager = fixture.manager(StubArchive::map_region(b"x"), web);
        fs::write(fixture.storage.path().join("a.obf"), b"fresh").unwrap();
        manager.rescan().unwrap();
        manager.refresh_catalog().unwrap();

        assert!(manager.available_updates().is_empty());
    }
}
