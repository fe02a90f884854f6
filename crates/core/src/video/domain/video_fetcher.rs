use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    /// The source could not be reached at all (DNS, connect, TLS).
    #[error("video source unavailable at {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },
    /// The source answered but the transfer did not complete.
    #[error("download from {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },
}

/// Acquires video bytes from a remote locator into a local file.
///
/// The pipeline does not care where frames come from; this seam exists so
/// the scanner only ever sees a local, seekable path. No retries: a failed
/// fetch is fatal for the request.
pub trait VideoFetcher: Send {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}
