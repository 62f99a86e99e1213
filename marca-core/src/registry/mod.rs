mod auth;
mod extract;
mod form;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{
    bounded, teardown, AutomationPage, AutomationSession, CheckError, CheckResult, SessionFactory,
};
use crate::config::CheckerConfig;

pub use auth::AuthenticationFlow;
pub use extract::{
    harvest_script, is_active, HarvestPayload, RecordExtractor, TrademarkRecord,
    EXTINGUISHED_KEYWORDS, NO_RESULTS_PHRASES, SITUATION_KEYWORDS,
};
pub use form::{SearchFormLocator, SEARCH_FIELD_SELECTOR};
pub use state::{classify, PageState};

use form::FRAME_WALK;

pub const CLASS_FIELD_SELECTOR: &str = "input[name=\"classe\"], input[name=\"classificacao\"]";
pub const SUBMIT_CONTROL_SELECTOR: &str =
    "input[type=\"submit\"], button[type=\"submit\"], a[href*=\"pesquisar\"]";

/// Outcome of one trademark registry search. Records only ever travel with
/// an `Unavailable` verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrademarkCheckResult {
    Available {
        details: String,
    },
    Unavailable {
        details: String,
        records: Vec<TrademarkRecord>,
    },
    Error {
        details: String,
    },
}

impl TrademarkCheckResult {
    pub fn records(&self) -> &[TrademarkRecord] {
        match self {
            TrademarkCheckResult::Unavailable { records, .. } => records,
            _ => &[],
        }
    }

    /// True when at least one found process still blocks the name.
    pub fn is_active(&self) -> bool {
        is_active(self.records())
    }
}

#[derive(Debug, Deserialize)]
struct FormActionOutcome {
    ok: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    class_filled: bool,
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn fill_script(context: i64, name: &str, ncl_class: Option<u8>) -> String {
    let name_js = js_string(name);
    let class_js = ncl_class
        .map(|class| class.to_string())
        .unwrap_or_else(|| "null".to_string());
    format!(
        r#"(() => {{
{FRAME_WALK}
    const doc = contexts[{context}];
    if (!doc) return {{ ok: false, reason: 'frame context vanished' }};
    const field = doc.querySelector('{SEARCH_FIELD_SELECTOR}');
    if (!field) return {{ ok: false, reason: 'search field vanished' }};
    const put = (input, value) => {{
        input.focus();
        input.value = value;
        input.dispatchEvent(new Event('input', {{ bubbles: true }}));
        input.dispatchEvent(new Event('change', {{ bubbles: true }}));
    }};
    put(field, {name_js});
    let classFilled = false;
    const classValue = {class_js};
    if (classValue !== null) {{
        const classField = doc.querySelector('{CLASS_FIELD_SELECTOR}');
        if (classField) {{
            put(classField, String(classValue));
            classFilled = true;
        }}
    }}
    return {{ ok: true, class_filled: classFilled }};
}})()"#
    )
}

fn submit_script(context: i64) -> String {
    format!(
        r#"(() => {{
{FRAME_WALK}
    const doc = contexts[{context}];
    if (!doc) return {{ ok: false, reason: 'frame context vanished' }};
    const control = doc.querySelector('{SUBMIT_CONTROL_SELECTOR}');
    if (!control) return {{ ok: false, reason: 'submit control missing' }};
    control.click();
    return {{ ok: true }};
}})()"#
    )
}

fn ready_script() -> String {
    format!(
        r##"(() => {{
{FRAME_WALK}
    const ready = (doc) => {{
        try {{
            if (doc.querySelector('table, font.normal[color="#000000"], a.visitado')) return true;
            const text = doc.body ? doc.body.innerText : '';
            if (text.includes('Nenhum registro') || text.includes('Não foram encontrados')) return true;
        }} catch (err) {{}}
        return false;
    }};
    return contexts.some(ready);
}})()"##
    )
}

/// Drives one registry search end to end inside its own browser session:
/// navigate → classify → [authenticate → re-navigate] → locate form →
/// submit → await results → extract. Every failure is folded into the
/// returned result; nothing escapes to the caller.
pub struct RegistryChecker {
    config: Arc<CheckerConfig>,
    sessions: Arc<dyn SessionFactory>,
    auth: AuthenticationFlow,
    locator: SearchFormLocator,
    extractor: RecordExtractor,
}

impl RegistryChecker {
    pub fn new(config: Arc<CheckerConfig>, sessions: Arc<dyn SessionFactory>) -> Self {
        let navigation_timeout = Duration::from_secs(config.timeouts.navigation_secs);
        let auth = AuthenticationFlow::new(config.registry.credentials.clone(), navigation_timeout);
        let locator = SearchFormLocator::new(
            config.registry.poll_attempts,
            Duration::from_millis(config.registry.poll_delay_ms),
            PathBuf::from(&config.observability.screenshot_dir),
        );
        Self {
            config,
            sessions,
            auth,
            locator,
            extractor: RecordExtractor::new(),
        }
    }

    pub async fn check(&self, name: &str, ncl_class: Option<u8>) -> TrademarkCheckResult {
        info!(name, class = ?ncl_class, "starting trademark registry check");
        let deadline = Duration::from_secs(self.config.timeouts.check_deadline_secs);

        let mut session = match self.sessions.create().await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "trademark registry session launch failed");
                return TrademarkCheckResult::Error {
                    details: format!("Erro: {err}"),
                };
            }
        };
        let outcome = bounded(deadline, self.run_pipeline(session.as_ref(), name, ncl_class)).await;
        teardown(&mut session).await;

        match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "trademark registry pipeline failed");
                TrademarkCheckResult::Error {
                    details: format!("Erro: {err}"),
                }
            }
        }
    }

    async fn run_pipeline(
        &self,
        session: &dyn AutomationSession,
        name: &str,
        ncl_class: Option<u8>,
    ) -> CheckResult<TrademarkCheckResult> {
        let navigation_timeout = Duration::from_secs(self.config.timeouts.navigation_secs);
        let search_url = self.config.registry.search_url.as_str();
        let mut page = session.open_page().await?;

        self.navigate_tolerant(page.as_mut(), search_url, navigation_timeout)
            .await?;
        let mut state = classify(&page.content().await?);
        debug!(?state, "registry page state after navigation");

        if state == PageState::LoginRequired {
            self.auth.login(page.as_mut()).await?;
            // The post-login landing page is not assumed stable; always force
            // a fresh navigation to the search page.
            self.navigate_tolerant(page.as_mut(), search_url, navigation_timeout)
                .await?;
            state = classify(&page.content().await?);
            debug!(?state, "registry page state after authentication");
        }

        let context = self.locator.locate(page.as_mut()).await?;
        self.fill_form(page.as_mut(), context, name, ncl_class)
            .await?;
        self.submit(page.as_mut(), context).await?;
        self.await_results(page.as_mut()).await;
        let payload = self.harvest(page.as_mut()).await?;
        Ok(self.classify_results(name, payload))
    }

    /// Legacy registry pages routinely time out while still rendering usable
    /// markup; the state classifier decides what actually loaded.
    async fn navigate_tolerant(
        &self,
        page: &mut dyn AutomationPage,
        url: &str,
        timeout: Duration,
    ) -> CheckResult<()> {
        match page.navigate(url, timeout).await {
            Ok(_) => Ok(()),
            Err(CheckError::NavigationTimeout(message)) => {
                debug!(%message, "navigation timed out, inspecting rendered content anyway");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn fill_form(
        &self,
        page: &mut dyn AutomationPage,
        context: i64,
        name: &str,
        ncl_class: Option<u8>,
    ) -> CheckResult<()> {
        let value = page
            .evaluate(&fill_script(context, name, ncl_class))
            .await?;
        let outcome: FormActionOutcome = serde_json::from_value(value)
            .map_err(|err| CheckError::Extraction(format!("fill outcome undecodable: {err}")))?;
        if !outcome.ok {
            return Err(CheckError::FormNotFound(
                outcome.reason.unwrap_or_else(|| "fill failed".to_string()),
            ));
        }
        if ncl_class.is_some() && !outcome.class_filled {
            debug!("class filter field absent, searching without class filter");
        }
        Ok(())
    }

    async fn submit(&self, page: &mut dyn AutomationPage, context: i64) -> CheckResult<()> {
        let value = page.evaluate(&submit_script(context)).await?;
        let outcome: FormActionOutcome = serde_json::from_value(value)
            .map_err(|err| CheckError::Extraction(format!("submit outcome undecodable: {err}")))?;
        if !outcome.ok {
            return Err(CheckError::FormNotFound(
                outcome
                    .reason
                    .unwrap_or_else(|| "submit control missing".to_string()),
            ));
        }
        debug!("search form submitted");
        Ok(())
    }

    /// Races the known "results are ready" signals by polling, bounded by
    /// `results_wait_secs`, then lets late frame swaps settle. A quiet page
    /// is not an error here; extraction decides.
    async fn await_results(&self, page: &mut dyn AutomationPage) {
        let script = ready_script();
        let budget = Duration::from_secs(self.config.timeouts.results_wait_secs);
        let started = tokio::time::Instant::now();
        while started.elapsed() < budget {
            match page.evaluate(&script).await {
                Ok(value) if value.as_bool() == Some(true) => {
                    debug!("results signal observed");
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(error = %err, "results probe failed, page may be mid-navigation");
                }
            }
            sleep(Duration::from_millis(500)).await;
        }
        sleep(Duration::from_millis(self.config.timeouts.results_settle_ms)).await;
    }

    async fn harvest(&self, page: &mut dyn AutomationPage) -> CheckResult<HarvestPayload> {
        let value = page
            .evaluate(&harvest_script())
            .await
            .map_err(|err| CheckError::Extraction(format!("results harvest failed: {err}")))?;
        serde_json::from_value(value)
            .map_err(|err| CheckError::Extraction(format!("harvest payload undecodable: {err}")))
    }

    fn classify_results(&self, name: &str, payload: HarvestPayload) -> TrademarkCheckResult {
        if self.extractor.no_results(&payload.body_text) {
            info!("registry reported no matching records");
            return TrademarkCheckResult::Available {
                details: "Nenhum registro exato encontrado no INPI.".to_string(),
            };
        }
        let records = self.extractor.extract(name, &payload.rows);
        if records.is_empty() {
            // No explicit no-results phrase and nothing extracted: resolve
            // toward available rather than alarming on page-shape drift.
            info!("no structured records extracted");
            return TrademarkCheckResult::Available {
                details: "Nenhum registro exato encontrado.".to_string(),
            };
        }
        info!(count = records.len(), "registry records extracted");
        TrademarkCheckResult::Unavailable {
            details: format!("{} processos encontrados.", records.len()),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct NoSessionFactory;

    #[async_trait(?Send)]
    impl SessionFactory for NoSessionFactory {
        async fn create(&self) -> CheckResult<Box<dyn AutomationSession>> {
            Err(CheckError::Launch("not available in unit tests".into()))
        }
    }

    fn checker() -> RegistryChecker {
        RegistryChecker::new(
            Arc::new(CheckerConfig::default()),
            Arc::new(NoSessionFactory),
        )
    }

    fn payload(body_text: &str, rows: Vec<Vec<String>>) -> HarvestPayload {
        HarvestPayload {
            body_text: body_text.to_string(),
            rows,
        }
    }

    #[test]
    fn no_results_phrase_short_circuits_to_available() {
        let result = checker().classify_results(
            "acme",
            payload("Nenhum resultado foi encontrado", vec![]),
        );
        assert!(matches!(result, TrademarkCheckResult::Available { .. }));
    }

    #[test]
    fn extracted_records_mean_unavailable() {
        let rows = vec![vec![
            "ACME".to_string(),
            "000123456789".to_string(),
            "Em vigor".to_string(),
        ]];
        let result = checker().classify_results("acme", payload("resultados", rows));
        match &result {
            TrademarkCheckResult::Unavailable { details, records } => {
                assert_eq!(records.len(), 1);
                assert_eq!(details, "1 processos encontrados.");
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
        assert!(result.is_active());
    }

    #[test]
    fn empty_extraction_resolves_toward_available() {
        let rows = vec![vec![
            "OUTRA".to_string(),
            "000123456789".to_string(),
            "Em vigor".to_string(),
        ]];
        let result = checker().classify_results("acme", payload("alguma tabela", rows));
        assert!(matches!(result, TrademarkCheckResult::Available { .. }));
    }

    #[tokio::test]
    async fn launch_failure_becomes_error_status() {
        let result = checker().check("acme", Some(35)).await;
        match result {
            TrademarkCheckResult::Error { details } => {
                assert!(details.contains("chromium launch failed"));
            }
            other => panic!("expected error status, got {other:?}"),
        }
    }

    #[test]
    fn fill_script_embeds_escaped_name_and_class() {
        let script = fill_script(1, "O'Brien \"Co\"", Some(35));
        assert!(script.contains("contexts[1]"));
        assert!(script.contains("O'Brien \\\"Co\\\""));
        assert!(script.contains("const classValue = 35;"));

        let no_class = fill_script(0, "acme", None);
        assert!(no_class.contains("const classValue = null;"));
    }
}
