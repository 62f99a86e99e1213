use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::browser::SessionFactory;
use crate::config::CheckerConfig;
use crate::handles::{HandleCheckResult, HandleChecker};
use crate::registry::{RegistryChecker, TrademarkCheckResult};

/// Merged verdict for one candidate name. Built fresh per `check` call and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub name: String,
    pub trademark: TrademarkCheckResult,
    pub handle: HandleCheckResult,
}

/// Entry point of the verification engine. Runs the trademark and handle
/// pipelines concurrently; each converts its own failures into a degraded
/// status, so one collapsing source never hides what the other found.
pub struct AvailabilityChecker {
    registry: RegistryChecker,
    handles: HandleChecker,
}

impl AvailabilityChecker {
    pub fn new(config: Arc<CheckerConfig>, sessions: Arc<dyn SessionFactory>) -> Self {
        Self {
            registry: RegistryChecker::new(Arc::clone(&config), Arc::clone(&sessions)),
            handles: HandleChecker::new(config, sessions),
        }
    }

    /// Builds the aggregator from independently wired pipelines. Useful when
    /// the two sources should not share one session factory.
    pub fn from_parts(registry: RegistryChecker, handles: HandleChecker) -> Self {
        Self { registry, handles }
    }

    pub async fn check(&self, name: &str, ncl_class: Option<u8>) -> AvailabilityReport {
        info!(name, class = ?ncl_class, "starting availability check");
        let (trademark, handle) = futures::join!(
            self.registry.check(name, ncl_class),
            self.handles.check(name),
        );
        info!(name, "availability check finished");
        AvailabilityReport {
            name: name.to_string(),
            trademark,
            handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::browser::{
        AutomationPage, AutomationSession, CheckError, CheckResult, NavigationOutcome,
    };
    use crate::handles::HandleStatus;

    struct FailingFactory;

    #[async_trait(?Send)]
    impl SessionFactory for FailingFactory {
        async fn create(&self) -> CheckResult<Box<dyn AutomationSession>> {
            Err(CheckError::Launch("registry browser exploded".into()))
        }
    }

    struct NotFoundFactory;

    struct NotFoundSession;

    struct NotFoundPage;

    #[async_trait(?Send)]
    impl AutomationPage for NotFoundPage {
        async fn navigate(
            &mut self,
            _url: &str,
            _timeout: Duration,
        ) -> CheckResult<NavigationOutcome> {
            Ok(NavigationOutcome {
                http_status: Some(404),
            })
        }

        async fn current_url(&mut self) -> CheckResult<String> {
            Ok(String::new())
        }

        async fn title(&mut self) -> CheckResult<String> {
            Ok("Page Not Found".to_string())
        }

        async fn content(&mut self) -> CheckResult<String> {
            Ok(String::new())
        }

        async fn evaluate(&mut self, _script: &str) -> CheckResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        async fn fill(&mut self, _selector: &str, _text: &str) -> CheckResult<bool> {
            Ok(false)
        }

        async fn click(&mut self, _selector: &str) -> CheckResult<bool> {
            Ok(false)
        }

        async fn press_key(&mut self, _selector: &str, _key: &str) -> CheckResult<bool> {
            Ok(false)
        }

        async fn wait_for_navigation(&mut self, _timeout: Duration) -> CheckResult<bool> {
            Ok(false)
        }

        async fn screenshot(&mut self, _path: &Path) -> CheckResult<()> {
            Ok(())
        }

        async fn close(&mut self) -> CheckResult<()> {
            Ok(())
        }
    }

    #[async_trait(?Send)]
    impl AutomationSession for NotFoundSession {
        async fn open_page(&self) -> CheckResult<Box<dyn AutomationPage>> {
            Ok(Box::new(NotFoundPage))
        }

        async fn shutdown(&mut self) -> CheckResult<()> {
            Ok(())
        }
    }

    #[async_trait(?Send)]
    impl SessionFactory for NotFoundFactory {
        async fn create(&self) -> CheckResult<Box<dyn AutomationSession>> {
            Ok(Box::new(NotFoundSession))
        }
    }

    #[tokio::test]
    async fn registry_failure_never_suppresses_the_handle_result() {
        let config = Arc::new(CheckerConfig::default());
        let registry = RegistryChecker::new(Arc::clone(&config), Arc::new(FailingFactory));
        let handles = HandleChecker::new(Arc::clone(&config), Arc::new(NotFoundFactory));
        let checker = AvailabilityChecker::from_parts(registry, handles);

        let report = checker.check("Apex", Some(35)).await;

        match &report.trademark {
            TrademarkCheckResult::Error { details } => {
                assert!(details.contains("registry browser exploded"));
            }
            other => panic!("expected trademark error, got {other:?}"),
        }
        match &report.handle {
            HandleCheckResult::Single(variation) => {
                assert_eq!(variation.status, HandleStatus::Available);
            }
            other => panic!("expected single handle result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn report_echoes_the_candidate_name() {
        let config = Arc::new(CheckerConfig::default());
        let registry = RegistryChecker::new(Arc::clone(&config), Arc::new(FailingFactory));
        let handles = HandleChecker::new(Arc::clone(&config), Arc::new(FailingFactory));
        let checker = AvailabilityChecker::from_parts(registry, handles);

        let report = checker.check("Vela Azul", None).await;
        assert_eq!(report.name, "Vela Azul");
        assert_eq!(report.handle.variations().len(), 2);
    }
}
