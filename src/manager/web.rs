//! HTTP implementation of the [`WebClient`] contract.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::config::DEFAULT_DOWNLOAD_TIMEOUT;
use super::error::{ManagerError, ManagerResult};
use super::traits::{ProgressCallback, WebClient};

/// Buffer size for streaming downloads to disk (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Blocking HTTP client backed by `reqwest`.
#[derive(Debug)]
pub struct HttpWebClient {
    client: Client,
}

impl HttpWebClient {
    /// Create a client with the default timeout.
    pub fn new() -> ManagerResult<Self> {
        Self::with_timeout(DEFAULT_DOWNLOAD_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> ManagerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ManagerError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> ManagerResult<reqwest::blocking::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ManagerError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP status {}", status),
            });
        }
        Ok(response)
    }
}

impl WebClient for HttpWebClient {
    fn download_bytes(&self, url: &str) -> ManagerResult<Vec<u8>> {
        let response = self.get(url)?;
        let bytes = response.bytes().map_err(|e| ManagerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> ManagerResult<u64> {
        let mut response = self.get(url)?;
        let total_size = response.content_length().unwrap_or(0);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ManagerError::CreateDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = File::create(dest).map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let result = stream_response(&mut response, file, url, dest, total_size, progress);
        if result.is_err() {
            // No partial container may survive a failed or cancelled
            // transfer.
            fs::remove_file(dest).ok();
        }
        result
    }
}

fn stream_response(
    response: &mut reqwest::blocking::Response,
    file: File,
    url: &str,
    dest: &Path,
    total_size: u64,
    progress: Option<&ProgressCallback>,
) -> ManagerResult<u64> {
    let mut writer = BufWriter::new(file);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut downloaded = 0u64;

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| ManagerError::DownloadFailed {
                url: url.to_string(),
                reason: format!("read error: {}", e),
            })?;

        if bytes_read == 0 {
            break;
        }

        writer
            .write_all(&buffer[..bytes_read])
            .map_err(|e| ManagerError::WriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })?;

        downloaded += bytes_read as u64;

        if let Some(cb) = progress {
            if !cb(downloaded, total_size) {
                debug!(url, downloaded, "download cancelled by progress callback");
                return Err(ManagerError::DownloadAborted {
                    url: url.to_string(),
                });
            }
        }
    }

    writer.flush().map_err(|e| ManagerError::WriteFailed {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(downloaded)
}
