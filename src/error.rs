use thiserror::Error;

/// Errors produced by the crawl and merge pipelines
#[derive(Error, Debug)]
pub enum CrawlError {
    /// The WebDriver session could not be established
    #[error("failed to start browser session: {0}")]
    SessionStart(#[from] fantoccini::error::NewSessionError),

    /// A WebDriver command failed after the session was established
    #[error("webdriver command failed: {0}")]
    Webdriver(#[from] fantoccini::error::CmdError),

    /// Navigation did not land on a usable page
    #[error("navigation failed for {0}")]
    Navigation(String),

    /// HTTP transport error during a download
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem error
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF parse or write error
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Configuration file could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
