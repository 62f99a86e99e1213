use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::cdp::browser_protocol::target::CreateTargetParams;
use chromiumoxide::handler::viewport::Viewport as ChromiumViewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CheckerConfig;

use super::error::{CheckError, CheckResult};
use super::page::{AutomationPage, AutomationSession, NavigationOutcome, SessionFactory};

const NAVIGATION_STATUS_SCRIPT: &str = r#"
(() => {
    const entries = performance.getEntriesByType('navigation');
    if (!entries.length) return null;
    const status = entries[0].responseStatus;
    return (typeof status === 'number' && status > 0) ? status : null;
})()
"#;

/// Launches one isolated Chromium instance per created session. Sessions are
/// deliberately never pooled or reused across candidate names.
#[derive(Debug, Clone)]
pub struct SessionLauncher {
    config: Arc<CheckerConfig>,
}

impl SessionLauncher {
    pub fn new(config: Arc<CheckerConfig>) -> Self {
        Self { config }
    }

    fn build_chromium_config(&self) -> CheckResult<ChromiumConfig> {
        let chromium = &self.config.chromium;
        let mut builder = ChromiumConfig::builder().viewport(ChromiumViewport {
            width: chromium.window_width,
            height: chromium.window_height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: chromium.window_width >= chromium.window_height,
            has_touch: false,
        });

        if let Some(executable) = &chromium.executable_path {
            builder = builder.chrome_executable(executable);
        }
        if !chromium.headless {
            builder = builder.with_head();
        }
        if !chromium.sandbox {
            builder = builder.no_sandbox();
        }

        let mut args = vec![
            format!("--user-agent={}", chromium.user_agent),
            format!(
                "--window-size={},{}",
                chromium.window_width, chromium.window_height
            ),
            "--disable-dev-shm-usage".to_string(),
            "--disable-features=IsolateOrigins,site-per-process".to_string(),
        ];
        if chromium.disable_gpu {
            args.push("--disable-gpu".into());
        }
        builder = builder.args(args);

        builder.build().map_err(CheckError::Configuration)
    }
}

#[async_trait(?Send)]
impl SessionFactory for SessionLauncher {
    async fn create(&self) -> CheckResult<Box<dyn AutomationSession>> {
        let chromium_config = self.build_chromium_config()?;
        info!(
            headless = self.config.chromium.headless,
            width = self.config.chromium.window_width,
            height = self.config.chromium.window_height,
            "launching chromium instance"
        );

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|err| CheckError::Launch(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "chromium handler reported error");
                }
            }
        });

        Ok(Box::new(ChromiumSession {
            browser,
            handler_task: Some(handler_task),
            user_agent: self.config.chromium.user_agent.clone(),
        }))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    handler_task: Option<JoinHandle<()>>,
    user_agent: String,
}

#[async_trait(?Send)]
impl AutomationSession for ChromiumSession {
    async fn open_page(&self) -> CheckResult<Box<dyn AutomationPage>> {
        let params = CreateTargetParams::new("about:blank");
        let page = self.browser.new_page(params).await?;
        let ua_params = SetUserAgentOverrideParams::builder()
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(CheckError::Configuration)?;
        page.set_user_agent(ua_params).await?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&mut self) -> CheckResult<()> {
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "failed to close browser gracefully");
        }
        if let Some(handle) = self.handler_task.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "browser handler join error");
            }
        }
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(handle) = &self.handler_task {
            if !handle.is_finished() {
                warn!("chromium session dropped without explicit shutdown");
            }
        }
    }
}

pub struct ChromiumPage {
    page: Page,
}

#[async_trait(?Send)]
impl AutomationPage for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> CheckResult<NavigationOutcome> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(CheckError::Configuration)?;
        let load = async {
            self.page.goto(params).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, CheckError>(())
        };
        match tokio::time::timeout(timeout, load).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(CheckError::NavigationTimeout(format!(
                    "{url} did not finish loading within {}s",
                    timeout.as_secs()
                )))
            }
        }
        let http_status = self
            .evaluate(NAVIGATION_STATUS_SCRIPT)
            .await
            .ok()
            .and_then(|value| value.as_u64())
            .map(|status| status as u16);
        Ok(NavigationOutcome { http_status })
    }

    async fn current_url(&mut self) -> CheckResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn title(&mut self) -> CheckResult<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn content(&mut self) -> CheckResult<String> {
        Ok(self.page.content().await?)
    }

    async fn evaluate(&mut self, script: &str) -> CheckResult<serde_json::Value> {
        self.page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|err| {
                CheckError::Extraction(format!("failed to decode evaluation payload: {err}"))
            })
    }

    async fn fill(&mut self, selector: &str, text: &str) -> CheckResult<bool> {
        match self.page.find_element(selector).await {
            Ok(element) => {
                element.click().await?;
                element.type_str(text).await?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn click(&mut self, selector: &str) -> CheckResult<bool> {
        match self.page.find_element(selector).await {
            Ok(element) => {
                element.click().await?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn press_key(&mut self, selector: &str, key: &str) -> CheckResult<bool> {
        match self.page.find_element(selector).await {
            Ok(element) => {
                element.press_key(key).await?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn wait_for_navigation(&mut self, timeout: Duration) -> CheckResult<bool> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(err)) => {
                debug!(error = %err, "post-submit navigation wait failed");
                Ok(false)
            }
            Err(_) => Ok(false),
        }
    }

    async fn screenshot(&mut self, path: &Path) -> CheckResult<()> {
        let params = ScreenshotParams::builder().build();
        let bytes = self.page.screenshot(params).await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn close(&mut self) -> CheckResult<()> {
        self.page.clone().close().await?;
        Ok(())
    }
}

/// Runs an already-built pipeline future under `deadline`, mapping expiry to
/// `CheckError::Timeout`. The future is dropped on expiry, which aborts any
/// in-flight navigation or wait at its next suspension point.
pub async fn bounded<T>(
    deadline: Duration,
    op: impl std::future::Future<Output = CheckResult<T>>,
) -> CheckResult<T> {
    match tokio::time::timeout(deadline, op).await {
        Ok(result) => result,
        Err(_) => Err(CheckError::Timeout(format!(
            "check deadline of {}s",
            deadline.as_secs()
        ))),
    }
}

/// Tears a session down, logging instead of propagating so teardown can
/// never mask the pipeline outcome it follows.
pub async fn teardown(session: &mut Box<dyn AutomationSession>) {
    if let Err(err) = session.shutdown().await {
        warn!(error = %err, "failed to shut down automation session");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bounded_maps_expiry_to_timeout_and_drops_the_op() {
        let witness = Rc::new(RefCell::new(false));
        let witness_for_op = Rc::clone(&witness);
        let result: CheckResult<()> = bounded(Duration::from_secs(1), async move {
            tokio::time::sleep(Duration::from_secs(600)).await;
            *witness_for_op.borrow_mut() = true;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(CheckError::Timeout(_))));
        assert!(!*witness.borrow(), "aborted op must not have completed");
    }

    #[tokio::test]
    async fn bounded_passes_results_through() {
        let result = bounded(Duration::from_secs(1), async { Ok(7u32) })
            .await
            .unwrap();
        assert_eq!(result, 7);
    }
}
