use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::browser::{AutomationPage, AutomationSession, CheckResult};

/// Title fragments that mean the profile host served its 404 page.
pub const NOT_FOUND_TITLES: &[&str] = &["Page Not Found", "Página não encontrada"];

/// Body fragments for profiles that exist but are broken, removed or
/// banned. These still occupy the handle.
pub const BROKEN_PROFILE_PHRASES: &[&str] = &[
    "Sorry, this page isn't available",
    "A página não está disponível",
    "Esta página não está disponível",
    "Profile isn't available",
    "isn't available",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleStatus {
    Available,
    Unavailable,
    Ambiguous,
}

/// Minimal display data for a found (or placeholder) profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub username: String,
    pub name: String,
    pub details: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleVariationResult {
    pub variant: String,
    pub status: HandleStatus,
    pub message: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_summary: Option<ProfileSummary>,
}

#[derive(Debug, Default, Deserialize)]
struct MetaPayload {
    title: String,
    description: String,
    image: String,
}

const META_SCRIPT: &str = r#"
(() => {
    const read = (property) => {
        const node = document.querySelector(`meta[property="${property}"]`);
        return (node && node.content) ? node.content : '';
    };
    return {
        title: read('og:title'),
        description: read('og:description'),
        image: read('og:image'),
    };
})()
"#;

/// Classifies one handle variation by loading its profile page and reading
/// whatever the host leaked: response status, 404 titles, broken-profile
/// phrases, OpenGraph tags, login redirects. One failing variation never
/// takes down its siblings; failures degrade to `Ambiguous` locally.
pub struct ProfileClassifier {
    profile_base_url: String,
    navigation_timeout: Duration,
}

impl ProfileClassifier {
    pub fn new(profile_base_url: String, navigation_timeout: Duration) -> Self {
        Self {
            profile_base_url: profile_base_url.trim_end_matches('/').to_string(),
            navigation_timeout,
        }
    }

    pub fn profile_url(&self, variant: &str) -> String {
        format!("{}/{}/", self.profile_base_url, variant)
    }

    pub async fn classify(
        &self,
        session: &dyn AutomationSession,
        variant: String,
    ) -> HandleVariationResult {
        let url = self.profile_url(&variant);
        debug!(%variant, "checking profile handle");

        let mut page = match session.open_page().await {
            Ok(page) => page,
            Err(err) => return self.degraded(variant, url, &err.to_string()),
        };
        let outcome = self.classify_page(page.as_mut(), &variant, &url).await;
        if let Err(err) = page.close().await {
            debug!(error = %err, "failed to close profile page");
        }
        match outcome {
            Ok(result) => result,
            Err(err) => self.degraded(variant, url, &err.to_string()),
        }
    }

    async fn classify_page(
        &self,
        page: &mut dyn AutomationPage,
        variant: &str,
        url: &str,
    ) -> CheckResult<HandleVariationResult> {
        let navigation = page.navigate(url, self.navigation_timeout).await?;
        let title = page.title().await?;
        let content = page.content().await?;
        let current_url = page.current_url().await?;

        debug!(
            status = ?navigation.http_status,
            %title,
            "profile page loaded"
        );

        if navigation.http_status == Some(404)
            || NOT_FOUND_TITLES
                .iter()
                .any(|fragment| title.contains(fragment))
        {
            info!(%variant, "profile not found, handle available");
            return Ok(self.result(variant, url, HandleStatus::Available, "Disponível", None));
        }

        if BROKEN_PROFILE_PHRASES
            .iter()
            .any(|phrase| content.contains(phrase))
        {
            info!(%variant, "profile broken or banned, handle occupied");
            // A placeholder summary keeps the downstream "view" action alive
            // even though the host shows nothing.
            let placeholder = ProfileSummary {
                username: variant.to_string(),
                name: "Perfil Indisponível".to_string(),
                details: "Este perfil foi removido, banido ou está temporariamente indisponível."
                    .to_string(),
                image_url: String::new(),
            };
            return Ok(self.result(
                variant,
                url,
                HandleStatus::Unavailable,
                "Indisponível (Link Quebrado/Banido)",
                Some(placeholder),
            ));
        }

        let meta: MetaPayload =
            serde_json::from_value(page.evaluate(META_SCRIPT).await?).unwrap_or_default();
        if self.title_identifies_profile(&meta.title, variant) {
            info!(%variant, "profile found, handle occupied");
            let summary = ProfileSummary {
                username: variant.to_string(),
                name: meta
                    .title
                    .split('(')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                details: meta
                    .description
                    .split('-')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                image_url: meta.image,
            };
            return Ok(self.result(
                variant,
                url,
                HandleStatus::Unavailable,
                "Perfil encontrado",
                Some(summary),
            ));
        }

        if current_url.contains("login") {
            debug!(%variant, "redirected to login wall");
            return Ok(self.result(variant, url, HandleStatus::Ambiguous, "Exige Login", None));
        }

        Ok(self.result(
            variant,
            url,
            HandleStatus::Available,
            "Provavelmente disponível",
            None,
        ))
    }

    fn title_identifies_profile(&self, title: &str, variant: &str) -> bool {
        if title.is_empty() {
            return false;
        }
        title.contains(&format!("(@{variant})"))
            || title.contains(&format!("@{variant}"))
            || (title.contains('(') && title.contains(')'))
    }

    fn result(
        &self,
        variant: &str,
        url: &str,
        status: HandleStatus,
        message: &str,
        profile_summary: Option<ProfileSummary>,
    ) -> HandleVariationResult {
        HandleVariationResult {
            variant: variant.to_string(),
            status,
            message: message.to_string(),
            url: url.to_string(),
            profile_summary,
        }
    }

    /// A navigation error that clearly says 404 still means "available";
    /// everything else stays undecidable for this variant only.
    fn degraded(&self, variant: String, url: String, error: &str) -> HandleVariationResult {
        if error.contains("404") {
            return HandleVariationResult {
                variant,
                status: HandleStatus::Available,
                message: "Disponível".to_string(),
                url,
                profile_summary: None,
            };
        }
        HandleVariationResult {
            variant,
            status: HandleStatus::Ambiguous,
            message: format!("Erro: {error}"),
            url,
            profile_summary: None,
        }
    }
}
