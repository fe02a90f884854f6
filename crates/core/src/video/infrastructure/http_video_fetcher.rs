use std::fs;
use std::io::Write;
use std::path::Path;

use crate::video::domain::video_fetcher::{FetchError, VideoFetcher};

/// Downloads a video over HTTP(S) to a caller-owned local path.
///
/// The caller owns the destination (typically inside a per-request temp
/// directory), so cleanup happens with the rest of the request's resources.
pub struct HttpVideoFetcher;

impl HttpVideoFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpVideoFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoFetcher for HttpVideoFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response =
            reqwest::blocking::get(url).map_err(|e| FetchError::SourceUnavailable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let response = response
            .error_for_status()
            .map_err(|e| FetchError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let bytes = response.bytes().map_err(|e| FetchError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        // Write to a temp file first, then rename, so an interrupted
        // transfer never leaves a half-written video at `dest`.
        let temp_path = dest.with_extension("part");
        write_all(&temp_path, &bytes).map_err(|e| FetchError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        fs::rename(&temp_path, dest).map_err(|e| FetchError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        log::info!("Downloaded {} bytes from {url}", bytes.len());
        Ok(())
    }
}

fn write_all(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.flush()
}
