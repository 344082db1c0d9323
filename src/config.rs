use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Top-level configuration for the crawler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Download pool behaviour
    #[serde(default)]
    pub download: DownloadConfig,

    /// Where files land on disk
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP identity and transport options
    #[serde(default)]
    pub network: NetworkConfig,

    /// Browser session options
    #[serde(default)]
    pub browser: BrowserConfig,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Maximum number of concurrent download workers
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,

    /// Write-buffer size for streamed bodies, in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Attempts per file before a download is reported as failed
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base directory for downloaded files
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Create one subdirectory per sanitized host
    #[serde(default)]
    pub create_subfolder: bool,

    /// Re-download files that already exist at the target path
    #[serde(default)]
    pub overwrite_existing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// User-Agent applied to both the browser session and the downloader
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra request headers for the downloader
    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,

    /// Verify TLS certificates on downloads
    #[serde(default)]
    pub verify_ssl: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Pause after navigation, in milliseconds
    #[serde(default = "default_slow_mo")]
    pub slow_mo: u64,

    /// Extra settling delay after load, for script-driven DOM mutations.
    /// Client-rendered pages have no principled upper bound; this is an
    /// empirical knob, not a correctness guarantee.
    #[serde(default = "default_settle_grace_ms")]
    pub settle_grace_ms: u64,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_max_workers() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    8192
}

fn default_retry_count() -> u32 {
    3
}

fn default_base_dir() -> String {
    "./downloads".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_headers() -> HashMap<String, String> {
    HashMap::from([
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        ),
        (
            "Accept-Language".to_string(),
            "zh-TW,zh;q=0.9,en;q=0.8".to_string(),
        ),
    ])
}

fn default_headless() -> bool {
    true
}

fn default_slow_mo() -> u64 {
    100
}

fn default_settle_grace_ms() -> u64 {
    2000
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            timeout: default_timeout_secs(),
            chunk_size: default_chunk_size(),
            retry_count: default_retry_count(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            create_subfolder: false,
            overwrite_existing: false,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            headers: default_headers(),
            verify_ssl: false,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            slow_mo: default_slow_mo(),
            settle_grace_ms: default_settle_grace_ms(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            download: DownloadConfig::default(),
            output: OutputConfig::default(),
            network: NetworkConfig::default(),
            browser: BrowserConfig::default(),
            webdriver_url: default_webdriver_url(),
        }
    }
}

impl CrawlerConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.download.max_workers, 4);
        assert_eq!(config.download.timeout, 30);
        assert_eq!(config.download.retry_count, 3);
        assert_eq!(config.output.base_dir, "./downloads");
        assert!(config.browser.headless);
        assert!(!config.network.verify_ssl);
        assert_eq!(config.webdriver_url, "http://localhost:4444");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CrawlerConfig =
            serde_json::from_str(r#"{"download": {"max_workers": 8}}"#).expect("valid json");
        assert_eq!(config.download.max_workers, 8);
        assert_eq!(config.download.chunk_size, 8192);
        assert_eq!(config.browser.settle_grace_ms, 2000);
    }
}
