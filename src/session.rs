use crate::config::{BrowserConfig, NetworkConfig};
use crate::error::Result;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Shorter secondary window for the full-load wait; many sites never go idle
const LOAD_SETTLE_TIMEOUT: Duration = Duration::from_secs(15);

const READY_STATE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// WebDriver endpoints probed when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// One browser session, scoped to a single crawl invocation.
///
/// Opened at the start of a crawl and closed on every exit path; never reused
/// across crawls.
pub struct BrowserSession {
    client: Client,
    slow_mo: Duration,
    settle_grace: Duration,
}

impl BrowserSession {
    /// Connects to a WebDriver instance and starts one browser session.
    ///
    /// Headless mode and the User-Agent are applied through Chrome
    /// capabilities; extra request headers only apply to the downloader since
    /// WebDriver has no portable way to set them. Connection failure is fatal:
    /// the configured endpoint is tried first, then the common fallback
    /// endpoints, and the original error propagates if none respond.
    pub async fn open(
        webdriver_url: &str,
        browser: &BrowserConfig,
        network: &NetworkConfig,
    ) -> Result<Self> {
        let capabilities = build_capabilities(browser, network);

        let first_err = match connect(webdriver_url, capabilities.clone()).await {
            Ok(client) => {
                ::log::info!("connected to WebDriver at {}", webdriver_url);
                return Ok(Self::wrap(client, browser));
            }
            Err(e) => {
                ::log::error!("failed to connect to WebDriver at {}: {}", webdriver_url, e);
                e
            }
        };

        for url in FALLBACK_WEBDRIVER_URLS {
            if url == webdriver_url {
                continue;
            }
            ::log::info!("trying fallback WebDriver URL: {}", url);
            if let Ok(client) = connect(url, capabilities.clone()).await {
                ::log::info!("connected to fallback WebDriver at {}", url);
                return Ok(Self::wrap(client, browser));
            }
        }

        ::log::error!("failed to connect to any WebDriver endpoint");
        Err(first_err.into())
    }

    fn wrap(client: Client, browser: &BrowserConfig) -> Self {
        Self {
            client,
            slow_mo: Duration::from_millis(browser.slow_mo),
            settle_grace: Duration::from_millis(browser.settle_grace_ms),
        }
    }

    /// Loads a URL. Returns false, without raising, when the load fails or the
    /// session did not land on an http(s) page; the caller decides whether
    /// that aborts the crawl.
    pub async fn navigate_to(&self, url: &str) -> bool {
        ::log::info!("navigating to: {}", url);

        if let Err(e) = self.client.goto(url).await {
            ::log::warn!("navigation to {} failed: {}", url, e);
            return false;
        }

        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }

        // WebDriver does not surface the HTTP status; a load that never left
        // about:blank is the observable failure mode
        match self.client.current_url().await {
            Ok(current) if matches!(current.scheme(), "http" | "https") => {
                ::log::info!("page loaded: {}", current);
                true
            }
            Ok(current) => {
                ::log::warn!("navigation to {} landed on {}", url, current);
                false
            }
            Err(e) => {
                ::log::warn!("could not confirm navigation to {}: {}", url, e);
                false
            }
        }
    }

    /// Waits for the page to settle: DOM readiness within `timeout`, then a
    /// best-effort full-load wait with a shorter window (failure swallowed),
    /// then the fixed settle grace period for deferred script-driven DOM
    /// mutations. A compromise for client-rendered pages, not a guarantee.
    pub async fn await_settled(&self, timeout: Duration) {
        if self
            .poll_ready_state(&["interactive", "complete"], timeout)
            .await
        {
            ::log::debug!("DOM ready");
        } else {
            ::log::warn!("timed out waiting for DOM readiness, continuing");
        }

        if !self.poll_ready_state(&["complete"], LOAD_SETTLE_TIMEOUT).await {
            ::log::warn!("page never reported a complete load, continuing");
        }

        if !self.settle_grace.is_zero() {
            tokio::time::sleep(self.settle_grace).await;
            ::log::debug!("settle grace period elapsed");
        }
    }

    async fn poll_ready_state(&self, accepted: &[&str], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .client
                .execute("return document.readyState;", vec![])
                .await
            {
                Ok(value) => {
                    if value.as_str().is_some_and(|state| accepted.contains(&state)) {
                        return true;
                    }
                }
                Err(e) => {
                    ::log::warn!("readyState query failed: {}", e);
                    return false;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(READY_STATE_POLL_INTERVAL).await;
        }
    }

    /// Snapshot of the rendered DOM
    pub async fn source(&self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    /// URL the session currently points at, used as the base for resolving
    /// relative links
    pub async fn current_url(&self) -> Result<Url> {
        Ok(self.client.current_url().await?)
    }

    /// Tears the session down. Release failures are logged, never propagated,
    /// so teardown always completes.
    pub async fn close(self) {
        match self.client.close().await {
            Ok(()) => ::log::info!("browser session closed"),
            Err(e) => ::log::warn!("failed to close browser session: {}", e),
        }
    }
}

async fn connect(
    webdriver_url: &str,
    capabilities: Capabilities,
) -> std::result::Result<Client, fantoccini::error::NewSessionError> {
    ClientBuilder::native()
        .capabilities(capabilities)
        .connect(webdriver_url)
        .await
}

fn build_capabilities(browser: &BrowserConfig, network: &NetworkConfig) -> Capabilities {
    let mut args: Vec<serde_json::Value> = Vec::new();
    if browser.headless {
        args.push("--headless=new".into());
    }
    if !network.user_agent.is_empty() {
        args.push(format!("--user-agent={}", network.user_agent).into());
    }

    let mut capabilities = Capabilities::new();
    capabilities.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({ "args": args }),
    );
    capabilities
}
