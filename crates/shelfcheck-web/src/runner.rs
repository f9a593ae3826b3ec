use crate::config::{BrowserConfig, WebConfig};
use crate::driver::{Driver, EokaDriver};
use crate::scenario::{ScenarioReport, SearchScenario};
use crate::Result;
use eoka::Browser;
use shelfcheck_support::EvidenceSink;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Result of running a config.
#[derive(Debug)]
pub struct RunResult {
    /// Whether the run succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Scenario outcome of the successful attempt.
    pub report: Option<ScenarioReport>,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
    /// Number of retry attempts made.
    pub retries: u32,
}

/// Runs the search scenario in a real browser.
pub struct Runner {
    browser: Browser,
    driver: EokaDriver,
}

impl Runner {
    /// Launch a browser with the given config.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            driver: EokaDriver::new(page),
        })
    }

    pub fn driver(&self) -> &EokaDriver {
        &self.driver
    }

    /// Run the scenario, retrying the whole run per `on_failure.retry`.
    pub async fn run(&mut self, config: &WebConfig, evidence: &dyn EvidenceSink) -> Result<RunResult> {
        let start = Instant::now();
        let retry = config.on_failure.as_ref().and_then(|f| f.retry.as_ref());
        let max_attempts = retry.map(|r| r.max_attempts).unwrap_or(1);
        let retry_delay = retry.map(|r| r.backoff_ms).unwrap_or(0);

        let mut last_error = None;
        let mut retries = 0;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                retries += 1;
                info!("Retry attempt {}/{}", attempt, max_attempts);
                if retry_delay > 0 {
                    tokio::time::sleep(Duration::from_millis(retry_delay)).await;
                }
            }

            match SearchScenario::new(&self.driver, config, evidence).run().await {
                Ok(report) => {
                    return Ok(RunResult {
                        success: true,
                        error: None,
                        report: Some(report),
                        duration_ms: start.elapsed().as_millis() as u64,
                        retries,
                    });
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    last_error = Some(e.to_string());
                    if attempt == max_attempts {
                        self.handle_failure(config, evidence).await;
                    }
                }
            }
        }

        Ok(RunResult {
            success: false,
            error: last_error,
            report: None,
            duration_ms: start.elapsed().as_millis() as u64,
            retries,
        })
    }

    async fn handle_failure(&self, config: &WebConfig, evidence: &dyn EvidenceSink) {
        let Some(ref on_failure) = config.on_failure else {
            return;
        };
        let Some(ref screenshot_path) = on_failure.screenshot else {
            return;
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = screenshot_path.replace("{timestamp}", &timestamp.to_string());
        info!("Saving failure screenshot to: {}", path);
        match self.driver.screenshot().await {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, &data) {
                    warn!("Failed to save screenshot: {}", e);
                }
                if let Err(e) = evidence.attach_screenshot("failure", data) {
                    warn!("Failed to record failure screenshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to take failure screenshot: {}", e),
        }
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
