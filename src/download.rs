use crate::config::{DownloadConfig, NetworkConfig, OutputConfig};
use crate::error::Result;
use crate::results::{DownloadResult, DownloadTask};
use crate::urls;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use url::Url;

/// Upper bound on the retry backoff, in seconds
const MAX_BACKOFF_SECS: u64 = 10;

/// Streams PDFs to disk with bounded concurrency and per-file retry.
///
/// One instance is shared across all download workers of a crawl; the
/// underlying reqwest client pools connections.
pub struct Downloader {
    client: reqwest::Client,
    download: DownloadConfig,
    output: OutputConfig,
}

impl Downloader {
    pub fn new(
        download: DownloadConfig,
        output: OutputConfig,
        network: &NetworkConfig,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &network.headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => ::log::warn!("skipping invalid configured header {:?}", key),
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .default_headers(headers)
            .danger_accept_invalid_certs(!network.verify_ssl)
            .timeout(Duration::from_secs(download.timeout.max(1)))
            .build()?;

        Ok(Self {
            client,
            download,
            output,
        })
    }

    /// Runs every task to completion with at most `max_workers` in flight.
    /// One result per task, in task order; a failed task never aborts its
    /// siblings.
    pub async fn download_batch(self: &Arc<Self>, tasks: Vec<DownloadTask>) -> Vec<DownloadResult> {
        let semaphore = Arc::new(Semaphore::new(self.download.max_workers.max(1)));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let semaphore = Arc::clone(&semaphore);
            let downloader = Arc::clone(self);
            let url = task.url.clone();
            let filename = task.filename.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                downloader.download_one(&task).await
            });
            handles.push((handle, url, filename));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, url, filename) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    ::log::error!("download worker for {} panicked: {}", url, e);
                    results.push(DownloadResult::failed(
                        &url,
                        &filename,
                        format!("download worker failed: {e}"),
                    ));
                }
            }
        }

        let ok = results.iter().filter(|r| r.success).count();
        ::log::info!("batch finished: {}/{} downloads succeeded", ok, results.len());
        results
    }

    /// Downloads a single file. All failure modes fold into a failed
    /// `DownloadResult`; this never raises.
    pub async fn download_one(&self, task: &DownloadTask) -> DownloadResult {
        let dir = self.target_dir(&task.url);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            return DownloadResult::failed(
                &task.url,
                &task.filename,
                format!("could not create output directory {}: {e}", dir.display()),
            );
        }

        let filepath = dir.join(&task.filename);

        // Existence check and download are not atomic; two tasks resolving to
        // the same filename may both pass the check and download twice. The
        // second write wins and the file stays intact.
        if !self.output.overwrite_existing && filepath.exists() {
            let size = tokio::fs::metadata(&filepath)
                .await
                .map(|m| m.len())
                .unwrap_or(0);
            ::log::info!("skipping existing file: {}", filepath.display());
            return DownloadResult::already_exists(&task.url, &task.filename, filepath, size);
        }

        let started = Instant::now();
        let mut attempt = 1;
        loop {
            match self.fetch_to_file(&task.url, &filepath).await {
                Ok(size) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    ::log::info!(
                        "downloaded {} ({} bytes in {:.1}s)",
                        task.filename,
                        size,
                        elapsed
                    );
                    return DownloadResult::completed(
                        &task.url,
                        &task.filename,
                        filepath,
                        size,
                        elapsed,
                    );
                }
                Err(e) if attempt < self.download.retry_count && is_transient(&e) => {
                    let delay = backoff_delay(attempt);
                    ::log::warn!(
                        "download attempt {}/{} for {} failed: {}, retrying in {}s",
                        attempt,
                        self.download.retry_count,
                        task.url,
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    ::log::error!(
                        "download of {} failed after {} attempt(s): {}",
                        task.url,
                        attempt,
                        e
                    );
                    return DownloadResult::failed(&task.url, &task.filename, e.to_string());
                }
            }
        }
    }

    /// Streams one response body to `filepath`. A partially written file is
    /// removed before the error propagates, so retries start clean.
    async fn fetch_to_file(&self, url: &str, filepath: &Path) -> Result<u64> {
        let result = self.stream_response(url, filepath).await;
        if result.is_err() && filepath.exists() {
            if let Err(e) = tokio::fs::remove_file(filepath).await {
                ::log::warn!(
                    "could not remove partial file {}: {}",
                    filepath.display(),
                    e
                );
            }
        }
        result
    }

    async fn stream_response(&self, url: &str, filepath: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let file = std::fs::File::create(filepath)?;
        let mut writer = std::io::BufWriter::with_capacity(self.download.chunk_size, file);
        let mut written: u64 = 0;

        let mut response = response;
        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        writer.flush()?;

        Ok(written)
    }

    /// Output directory for a task, optionally nested per sanitized host
    fn target_dir(&self, url: &str) -> PathBuf {
        let base = PathBuf::from(&self.output.base_dir);
        if !self.output.create_subfolder {
            return base;
        }
        match Url::parse(url).ok().and_then(|u| u.host_str().map(String::from)) {
            Some(host) => base.join(urls::sanitize_filename(&host)),
            None => base,
        }
    }
}

/// Worth retrying: timeouts, connection failures, and server-side errors.
/// Client errors (4xx) and local i/o failures are final.
fn is_transient(error: &crate::error::CrawlError) -> bool {
    match error {
        crate::error::CrawlError::Http(e) => {
            if e.is_timeout() || e.is_connect() {
                return true;
            }
            match e.status() {
                Some(status) => status.is_server_error() || status.as_u16() == 429,
                None => e.is_request(),
            }
        }
        _ => false,
    }
}

/// Exponential backoff capped at `MAX_BACKOFF_SECS`: 2s, 4s, 8s, 10s, ...
fn backoff_delay(attempt: u32) -> Duration {
    let exp = 2u64.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    Duration::from_secs(exp.min(MAX_BACKOFF_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(4), Duration::from_secs(10));
        assert_eq!(backoff_delay(30), Duration::from_secs(10));
    }

    #[test]
    fn test_target_dir_with_and_without_subfolder() {
        let flat = Downloader::new(
            DownloadConfig::default(),
            OutputConfig {
                base_dir: "/tmp/out".to_string(),
                ..OutputConfig::default()
            },
            &NetworkConfig::default(),
        )
        .expect("client builds");
        assert_eq!(
            flat.target_dir("http://example.com/a.pdf"),
            PathBuf::from("/tmp/out")
        );

        let nested = Downloader::new(
            DownloadConfig::default(),
            OutputConfig {
                base_dir: "/tmp/out".to_string(),
                create_subfolder: true,
                ..OutputConfig::default()
            },
            &NetworkConfig::default(),
        )
        .expect("client builds");
        assert_eq!(
            nested.target_dir("http://example.com/a.pdf"),
            PathBuf::from("/tmp/out/example.com")
        );
    }
}
