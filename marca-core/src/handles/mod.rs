mod profile;
mod variations;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::browser::{bounded, teardown, CheckError, SessionFactory};
use crate::config::CheckerConfig;

pub use profile::{
    HandleStatus, HandleVariationResult, ProfileClassifier, ProfileSummary,
    BROKEN_PROFILE_PHRASES, NOT_FOUND_TITLES,
};
pub use variations::variations_for;

/// Outcome of the handle pipeline: a single-variation verdict for simple
/// names, or one verdict per derived variation for compound names.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HandleCheckResult {
    Single(HandleVariationResult),
    Multiple { variations: Vec<HandleVariationResult> },
}

impl HandleCheckResult {
    pub fn variations(&self) -> &[HandleVariationResult] {
        match self {
            HandleCheckResult::Single(result) => std::slice::from_ref(result),
            HandleCheckResult::Multiple { variations } => variations,
        }
    }
}

/// Checks every derived handle variation inside one browser session, each
/// variation on its own page, a bounded number of pages in flight at once.
pub struct HandleChecker {
    config: Arc<CheckerConfig>,
    sessions: Arc<dyn SessionFactory>,
    classifier: ProfileClassifier,
}

impl HandleChecker {
    pub fn new(config: Arc<CheckerConfig>, sessions: Arc<dyn SessionFactory>) -> Self {
        let classifier = ProfileClassifier::new(
            config.handles.profile_base_url.clone(),
            Duration::from_secs(config.timeouts.navigation_secs),
        );
        Self {
            config,
            sessions,
            classifier,
        }
    }

    pub async fn check(&self, name: &str) -> HandleCheckResult {
        let variations = variations_for(name);
        info!(name, count = variations.len(), "starting handle check");

        let deadline = Duration::from_secs(self.config.timeouts.check_deadline_secs);
        let concurrency = self.config.handles.max_concurrent_pages.max(1);

        let mut session = match self.sessions.create().await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "handle session launch failed");
                return Self::shape(self.degraded(&variations, &err));
            }
        };
        let session_ref = session.as_ref();
        let outcome = bounded(deadline, async {
            let results = futures::stream::iter(
                variations
                    .iter()
                    .cloned()
                    .map(|variant| self.classifier.classify(session_ref, variant)),
            )
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await;
            Ok(results)
        })
        .await;
        teardown(&mut session).await;

        match outcome {
            Ok(results) => Self::shape(results),
            Err(err) => {
                warn!(error = %err, "handle pipeline failed, degrading every variation");
                Self::shape(self.degraded(&variations, &err))
            }
        }
    }

    fn degraded(&self, variations: &[String], err: &CheckError) -> Vec<HandleVariationResult> {
        variations
            .iter()
            .map(|variant| HandleVariationResult {
                variant: variant.clone(),
                status: HandleStatus::Ambiguous,
                message: format!("Erro: {err}"),
                url: self.classifier.profile_url(variant),
                profile_summary: None,
            })
            .collect()
    }

    fn shape(mut results: Vec<HandleVariationResult>) -> HandleCheckResult {
        if results.len() == 1 {
            HandleCheckResult::Single(results.remove(0))
        } else {
            HandleCheckResult::Multiple {
                variations: results,
            }
        }
    }
}
