use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{AutomationPage, CheckError, CheckResult};

use super::state::{classify, PageState};

/// The two names the registry has been observed to give its search field.
pub const SEARCH_FIELD_SELECTOR: &str = "input[name=\"marca\"], input[name=\"expressaoPesquisa\"]";

/// Collects the main document plus every same-origin nested frame document
/// into `contexts`, depth-first. Cross-origin frames are skipped; the legacy
/// registry frameset is same-origin throughout.
pub(crate) const FRAME_WALK: &str = r#"
    const collect = (win, acc) => {
        try { acc.push(win.document); } catch (err) {}
        for (let i = 0; i < win.frames.length; i++) {
            try { collect(win.frames[i], acc); } catch (err) {}
        }
        return acc;
    };
    const contexts = collect(window, []);
"#;

fn probe_script() -> String {
    format!(
        r#"(() => {{
{FRAME_WALK}
    for (let i = 0; i < contexts.length; i++) {{
        try {{
            if (contexts[i].querySelector('{SEARCH_FIELD_SELECTOR}')) return i;
        }} catch (err) {{}}
    }}
    return -1;
}})()"#
    )
}

/// Polls the page and its frames for the search field within a fixed budget
/// of attempts. On exhaustion it captures a diagnostic screenshot and
/// distinguishes a silently-returned login wall from a genuinely missing
/// form.
pub struct SearchFormLocator {
    attempts: usize,
    delay: Duration,
    screenshot_dir: PathBuf,
}

impl SearchFormLocator {
    pub fn new(attempts: usize, delay: Duration, screenshot_dir: PathBuf) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            screenshot_dir,
        }
    }

    /// Returns the index of the frame context holding the search field
    /// (0 = main document).
    pub async fn locate(&self, page: &mut dyn AutomationPage) -> CheckResult<i64> {
        let script = probe_script();
        for attempt in 0..self.attempts {
            if attempt > 0 {
                sleep(self.delay).await;
            }
            match page.evaluate(&script).await {
                Ok(value) => {
                    if let Some(index) = value.as_i64() {
                        if index >= 0 {
                            debug!(attempt, context = index, "search field located");
                            return Ok(index);
                        }
                    }
                }
                Err(err) => {
                    debug!(attempt, error = %err, "search field probe failed, page may still be loading");
                }
            }
        }

        self.capture_diagnostics(page).await;

        let content = page.content().await.unwrap_or_default();
        match classify(&content) {
            PageState::LoginRequired => Err(CheckError::Authentication(
                "page returned to the login wall, check credentials".into(),
            )),
            PageState::Unknown => Err(CheckError::UnknownPageState(
                "neither login nor search markers present after polling".into(),
            )),
            PageState::SearchReady => Err(CheckError::FormNotFound(format!(
                "search field absent after {} attempts",
                self.attempts
            ))),
        }
    }

    /// Best-effort screenshot for operators; failure to capture is logged
    /// and otherwise ignored.
    async fn capture_diagnostics(&self, page: &mut dyn AutomationPage) {
        if let Err(err) = tokio::fs::create_dir_all(&self.screenshot_dir).await {
            warn!(error = %err, dir = %self.screenshot_dir.display(), "could not create screenshot dir");
            return;
        }
        let file = format!(
            "registry-form-missing-{}.png",
            Utc::now().format("%Y%m%dT%H%M%S")
        );
        let path = self.screenshot_dir.join(file);
        match page.screenshot(&path).await {
            Ok(()) => info!(path = %path.display(), "diagnostic screenshot captured"),
            Err(err) => warn!(error = %err, "failed to capture diagnostic screenshot"),
        }
    }
}
