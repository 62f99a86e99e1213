use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::error::CheckResult;

/// What a completed navigation could tell us about itself. Legacy registry
/// pages frequently time out mid-load while still rendering usable markup,
/// so callers treat a missing status as "inspect the content and decide".
#[derive(Debug, Clone, Default)]
pub struct NavigationOutcome {
    pub http_status: Option<u16>,
}

/// Capability surface the pipelines require from one browser page. The
/// chromiumoxide binding lives in `automation`; tests substitute scripted
/// implementations.
#[async_trait(?Send)]
pub trait AutomationPage {
    /// Navigate and wait for the load within `timeout`. A timeout is an
    /// error (`CheckError::NavigationTimeout`); callers that can work with
    /// partially loaded markup catch it and continue.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> CheckResult<NavigationOutcome>;

    async fn current_url(&mut self) -> CheckResult<String>;

    async fn title(&mut self) -> CheckResult<String>;

    /// Rendered markup of the main document.
    async fn content(&mut self) -> CheckResult<String>;

    /// Evaluate a script against the loaded DOM and decode its JSON result.
    async fn evaluate(&mut self, script: &str) -> CheckResult<serde_json::Value>;

    /// Focus the first element matching `selector` and type `text` into it.
    /// Returns `false` when no element matches.
    async fn fill(&mut self, selector: &str, text: &str) -> CheckResult<bool>;

    /// Click the first element matching `selector`. Returns `false` when no
    /// element matches.
    async fn click(&mut self, selector: &str) -> CheckResult<bool>;

    /// Send a key press to the first element matching `selector`. Returns
    /// `false` when no element matches.
    async fn press_key(&mut self, selector: &str, key: &str) -> CheckResult<bool>;

    /// Wait for a navigation triggered by a prior interaction. Returns
    /// `false` when none happened within `timeout`; never treated as fatal.
    async fn wait_for_navigation(&mut self, timeout: Duration) -> CheckResult<bool>;

    /// Best-effort full-page screenshot written to `path`.
    async fn screenshot(&mut self, path: &Path) -> CheckResult<()>;

    async fn close(&mut self) -> CheckResult<()>;
}

/// One isolated automation session. Pages opened from the same session share
/// the browser process but nothing else the pipelines care about.
#[async_trait(?Send)]
pub trait AutomationSession {
    async fn open_page(&self) -> CheckResult<Box<dyn AutomationPage>>;

    async fn shutdown(&mut self) -> CheckResult<()>;
}

/// Creates sessions on demand. Each `check` invocation acquires fresh
/// sessions through this seam; tests plug in scripted factories.
#[async_trait(?Send)]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> CheckResult<Box<dyn AutomationSession>>;
}
