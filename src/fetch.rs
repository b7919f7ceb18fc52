//! Archive fetcher: download a remote archive to local storage, once.
//!
//! The download is streamed in `chunk_size` pieces into a temporary file
//! next to the destination and renamed into place only after the whole
//! body has been read. A failed transfer therefore never leaves a
//! truncated archive that a later call would mistake for a finished one.
//!
//! An existing file at the destination is trusted as-is: there is no
//! freshness or integrity check against the remote. Delete the local copy
//! to force a new download.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::{FetchConfig, ARCHIVE_EXTENSION};
use crate::error::{PipelineError, Result};

/// Streaming `GET url -> bytes` primitive.
///
/// Implementations must fail with [`PipelineError::Network`] on transport
/// errors and non-success statuses.
pub trait Transport: Send + Sync {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        (**self).open(url)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        (**self).open(url)
    }
}

/// Blocking HTTP transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Must not be called from inside an async runtime thread.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PipelineError::network("<client>", e))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| PipelineError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::network(url, format!("HTTP {}", status)));
        }
        Ok(Box::new(response))
    }
}

/// A downloaded (or previously downloaded) archive on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    pub source_url: String,
    pub local_path: PathBuf,
    pub size_bytes: u64,
}

pub struct ArchiveFetcher<T: Transport> {
    transport: T,
    chunk_size: usize,
}

impl<T: Transport> ArchiveFetcher<T> {
    pub fn new(transport: T, chunk_size: usize) -> Self {
        Self {
            transport,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Download `source_url` to `destination_dir/destination_name` unless
    /// that file already exists. Repeated calls return equal handles.
    pub fn fetch(
        &self,
        source_url: &str,
        destination_dir: &Path,
        destination_name: &str,
    ) -> Result<ArchiveHandle> {
        self.fetch_tracked(source_url, destination_dir, destination_name)
            .map(|(handle, _)| handle)
    }

    /// Like [`fetch`](Self::fetch), also reporting whether this call
    /// downloaded the archive (`false` when the local file was reused).
    pub fn fetch_tracked(
        &self,
        source_url: &str,
        destination_dir: &Path,
        destination_name: &str,
    ) -> Result<(ArchiveHandle, bool)> {
        validate_name(destination_name)?;

        std::fs::create_dir_all(destination_dir)?;
        let local_path = destination_dir.join(destination_name);

        if local_path.exists() {
            let size_bytes = std::fs::metadata(&local_path)?.len();
            debug!(url = source_url, path = %local_path.display(), "archive already present");
            let handle = ArchiveHandle {
                source_url: source_url.to_string(),
                local_path,
                size_bytes,
            };
            return Ok((handle, false));
        }

        info!(url = source_url, path = %local_path.display(), "downloading archive");
        let mut reader = self.transport.open(source_url)?;
        let mut tmp = NamedTempFile::new_in(destination_dir)?;
        let mut buf = vec![0u8; self.chunk_size];
        let mut size_bytes = 0u64;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PipelineError::network(source_url, e)),
            };
            tmp.write_all(&buf[..n])?;
            size_bytes += n as u64;
        }

        tmp.as_file().sync_all()?;
        tmp.persist(&local_path).map_err(|e| PipelineError::Io(e.error))?;
        info!(url = source_url, bytes = size_bytes, "archive downloaded");

        let handle = ArchiveHandle {
            source_url: source_url.to_string(),
            local_path,
            size_bytes,
        };
        Ok((handle, true))
    }
}

fn validate_name(name: &str) -> Result<()> {
    if !name.ends_with(ARCHIVE_EXTENSION) {
        return Err(PipelineError::InvalidArgument(format!(
            "archive name must end with {}: {}",
            ARCHIVE_EXTENSION, name
        )));
    }
    if name.contains('/') || name.contains('\\') || name == ARCHIVE_EXTENSION {
        return Err(PipelineError::InvalidArgument(format!(
            "archive name must be a plain file name: {}",
            name
        )));
    }
    Ok(())
}
