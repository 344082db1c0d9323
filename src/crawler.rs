use crate::config::CrawlerConfig;
use crate::discover;
use crate::download::Downloader;
use crate::error::{CrawlError, Result};
use crate::filter::{self, FilterMode};
use crate::merge;
use crate::results::{CrawlResult, DownloadStatus, DownloadTask, MergeResult};
use crate::session::BrowserSession;
use crate::urls;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long to wait for DOM readiness before discovery proceeds anyway
const PAGE_SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives one crawl end to end: open a session, navigate, discover links,
/// filter, download, and report.
///
/// The crawler itself is cheap to construct; the browser session and HTTP
/// client are created per crawl.
pub struct PdfCrawler {
    config: CrawlerConfig,
}

impl PdfCrawler {
    pub fn new(config: CrawlerConfig) -> Self {
        Self { config }
    }

    /// Crawls a single page for PDF links and downloads whatever passes the
    /// filter. Always returns a `CrawlResult`; failures are recorded in its
    /// `errors` rather than raised, and `execution_seconds` is set on every
    /// exit path.
    pub async fn crawl(&self, url: &str, mode: FilterMode, keywords: &[String]) -> CrawlResult {
        let started = Instant::now();
        let mut result = self.crawl_inner(url, mode, keywords).await;
        result.execution_seconds = started.elapsed().as_secs_f64();

        if result.success() {
            ::log::info!(
                "crawl of {} finished: {} found, {} filtered, {} downloaded in {:.1}s",
                result.url,
                result.pdf_links_found,
                result.pdf_links_filtered,
                result.pdf_downloaded,
                result.execution_seconds
            );
        } else {
            ::log::error!(
                "crawl of {} failed after {:.1}s: {}",
                result.url,
                result.execution_seconds,
                result.errors.join("; ")
            );
        }
        result
    }

    async fn crawl_inner(&self, url: &str, mode: FilterMode, keywords: &[String]) -> CrawlResult {
        let normalized = urls::normalize(url, None);
        let mut result = CrawlResult::new(&normalized);

        if !urls::validate_url(&normalized) {
            result.errors.push(format!("invalid target url: {url}"));
            return result;
        }

        let session = match BrowserSession::open(
            &self.config.webdriver_url,
            &self.config.browser,
            &self.config.network,
        )
        .await
        {
            Ok(session) => session,
            Err(e) => {
                result.errors.push(e.to_string());
                return result;
            }
        };

        // The session closes on every path out of here
        let outcome = self
            .crawl_with_session(&session, &normalized, mode, keywords, &mut result)
            .await;
        session.close().await;

        if let Err(e) = outcome {
            result.errors.push(e.to_string());
        }
        result
    }

    async fn crawl_with_session(
        &self,
        session: &BrowserSession,
        url: &str,
        mode: FilterMode,
        keywords: &[String],
        result: &mut CrawlResult,
    ) -> Result<()> {
        if !session.navigate_to(url).await {
            return Err(CrawlError::Navigation(url.to_string()));
        }
        session.await_settled(PAGE_SETTLE_TIMEOUT).await;

        let mut candidates = discover::discover(session).await?;
        if candidates.is_empty() {
            ::log::info!("main discovery found nothing, trying direct passes");
            candidates = discover::discover_direct(session).await?;
        }
        result.pdf_links_found = candidates.len();

        let filtered = filter::filter_candidates(candidates, mode, keywords);
        result.pdf_links_filtered = filtered.len();
        if filtered.is_empty() {
            ::log::info!("no pdf links left to download");
            return Ok(());
        }

        let tasks: Vec<DownloadTask> = filtered
            .into_iter()
            .map(|candidate| DownloadTask {
                url: candidate.url,
                filename: candidate.filename,
            })
            .collect();

        let downloader = Arc::new(Downloader::new(
            self.config.download.clone(),
            self.config.output.clone(),
            &self.config.network,
        )?);
        let downloads = downloader.download_batch(tasks).await;

        result.pdf_downloaded = downloads.iter().filter(|d| d.success).count();
        result.downloads = downloads;
        Ok(())
    }

    /// Merges the PDFs under the configured output directory, including any
    /// per-host subdirectories created during download.
    pub fn merge_downloads(
        &self,
        output_name: &str,
        mode: FilterMode,
        keywords: &[String],
        delete_originals: bool,
    ) -> MergeResult {
        merge::merge_directory(
            Path::new(&self.config.output.base_dir),
            output_name,
            mode,
            keywords,
            delete_originals,
        )
    }
}

/// Renders a human-readable summary of a crawl
pub fn generate_report(result: &CrawlResult) -> String {
    let mut lines = vec![
        format!("crawl report for {}", result.url),
        format!("  links found:   {}", result.pdf_links_found),
        format!("  after filter:  {}", result.pdf_links_filtered),
        format!("  downloaded:    {}", result.pdf_downloaded),
        format!("  elapsed:       {:.1}s", result.execution_seconds),
    ];

    for download in &result.downloads {
        let line = match download.status {
            DownloadStatus::Completed => format!(
                "  [completed] {} ({} bytes)",
                download.filename,
                download.size_bytes.unwrap_or(0)
            ),
            DownloadStatus::AlreadyExists => {
                format!("  [exists]    {}", download.filename)
            }
            DownloadStatus::Failed => format!(
                "  [failed]    {}: {}",
                download.filename,
                download
                    .error_message
                    .as_deref()
                    .unwrap_or("unknown error")
            ),
        };
        lines.push(line);
    }

    if !result.errors.is_empty() {
        lines.push("errors:".to_string());
        for error in &result.errors {
            lines.push(format!("  - {error}"));
        }
    }

    lines.join("\n")
}

/// Writes the full crawl result as pretty-printed JSON
pub fn save_report(result: &CrawlResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    ::log::info!("report saved to {}", path.display());
    Ok(())
}
