use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which discovery pass produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Anchor whose visible text contains "PDF"
    HrefTextMatch,
    /// Anchor whose href attribute contains ".pdf"
    HrefExtensionMatch,
    /// Non-anchor element containing "PDF" with a descendant anchor
    ElementTextMatch,
}

/// A discovered link believed to reference a PDF, prior to filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfLinkCandidate {
    /// Resolved absolute URL (http/https)
    pub url: String,

    /// Display text of the link (possibly empty)
    pub text: String,

    /// Suggested local filename, already sanitized
    pub filename: String,

    /// Discovery pass that first captured this URL
    pub method: DiscoveryMethod,
}

/// One unit of download work, derived 1:1 from a filtered candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTask {
    pub url: String,
    pub filename: String,
}

/// Terminal state of a single download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Completed,
    AlreadyExists,
    Failed,
}

/// Outcome of a single download task, immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    pub success: bool,
    pub url: String,
    pub filename: String,

    /// Final path on disk, present for completed and already-existing files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,

    pub status: DownloadStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DownloadResult {
    pub fn completed(
        url: &str,
        filename: &str,
        filepath: PathBuf,
        size_bytes: u64,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            success: true,
            url: url.to_string(),
            filename: filename.to_string(),
            filepath: Some(filepath),
            size_bytes: Some(size_bytes),
            elapsed_seconds: Some(elapsed_seconds),
            status: DownloadStatus::Completed,
            error_message: None,
        }
    }

    /// A file of the target name was already on disk; no network call was made
    pub fn already_exists(url: &str, filename: &str, filepath: PathBuf, size_bytes: u64) -> Self {
        Self {
            success: true,
            url: url.to_string(),
            filename: filename.to_string(),
            filepath: Some(filepath),
            size_bytes: Some(size_bytes),
            elapsed_seconds: Some(0.0),
            status: DownloadStatus::AlreadyExists,
            error_message: None,
        }
    }

    pub fn failed(url: &str, filename: &str, error_message: String) -> Self {
        Self {
            success: false,
            url: url.to_string(),
            filename: filename.to_string(),
            filepath: None,
            size_bytes: None,
            elapsed_seconds: None,
            status: DownloadStatus::Failed,
            error_message: Some(error_message),
        }
    }
}

/// Aggregate outcome of one crawl invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Target page URL
    pub url: String,

    /// Candidates discovered before filtering
    pub pdf_links_found: usize,

    /// Candidates remaining after the filter mode was applied
    pub pdf_links_filtered: usize,

    /// Downloads that ended successfully (completed or already on disk)
    pub pdf_downloaded: usize,

    pub downloads: Vec<DownloadResult>,

    /// Fatal-to-crawl errors recorded at the orchestrator boundary
    pub errors: Vec<String>,

    /// Wall-clock time of the whole crawl, set on every exit path
    pub execution_seconds: f64,
}

impl CrawlResult {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            pdf_links_found: 0,
            pdf_links_filtered: 0,
            pdf_downloaded: 0,
            downloads: Vec::new(),
            errors: Vec::new(),
            execution_seconds: 0.0,
        }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a PDF merge operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,

    pub total_pages: usize,

    /// Number of source files whose pages made it into the output
    pub files_merged: usize,

    pub output_size_mb: f64,

    pub deleted_originals: bool,

    pub deleted_files: Vec<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MergeResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output_file: None,
            total_pages: 0,
            files_merged: 0,
            output_size_mb: 0.0,
            deleted_originals: false,
            deleted_files: Vec::new(),
            error: Some(error.into()),
        }
    }
}
