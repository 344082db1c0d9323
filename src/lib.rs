//! Single-page PDF harvester: loads a page in a real browser, discovers PDF
//! links in the rendered DOM, downloads them with bounded concurrency, and
//! optionally merges the results into one document.

// Re-export modules
pub mod config;
pub mod crawler;
pub mod discover;
pub mod download;
pub mod error;
pub mod filter;
pub mod merge;
pub mod results;
pub mod session;
pub mod urls;

// Re-export commonly used types for convenience
pub use config::CrawlerConfig;
pub use crawler::PdfCrawler;
pub use error::{CrawlError, Result};
pub use filter::FilterMode;
pub use results::{CrawlResult, DownloadResult, MergeResult, PdfLinkCandidate};
