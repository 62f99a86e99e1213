use std::time::Duration;

use tracing::{debug, info};

use crate::browser::{AutomationPage, CheckError, CheckResult};
use crate::config::RegistryCredentials;

pub const PASSWORD_SELECTOR: &str = "input[type=\"password\"]";
pub const USERNAME_SELECTOR: &str =
    "input[name*=\"user\"], input[name*=\"login\"], input[type=\"text\"]";
pub const SUBMIT_SELECTOR: &str =
    "input[type=\"submit\"], button[type=\"submit\"], button:not([type])";

/// Fills and submits the registry's login form. The post-login landing page
/// is not trusted; the caller re-navigates to the search URL afterwards.
pub struct AuthenticationFlow {
    credentials: Option<RegistryCredentials>,
    navigation_timeout: Duration,
}

impl AuthenticationFlow {
    pub fn new(credentials: Option<RegistryCredentials>, navigation_timeout: Duration) -> Self {
        Self {
            credentials,
            navigation_timeout,
        }
    }

    pub async fn login(&self, page: &mut dyn AutomationPage) -> CheckResult<()> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            CheckError::Authentication("registry credentials not configured".into())
        })?;

        info!("handling registry login wall");

        if !page.fill(PASSWORD_SELECTOR, &credentials.password).await? {
            return Err(CheckError::Authentication(
                "login page found but password input is missing".into(),
            ));
        }
        if !page.fill(USERNAME_SELECTOR, &credentials.username).await? {
            return Err(CheckError::Authentication(
                "could not find a plausible username input".into(),
            ));
        }

        debug!("credentials filled, submitting login form");
        if !page.click(SUBMIT_SELECTOR).await? {
            // Legacy JSP forms without an explicit submit control still react
            // to Enter on the password field.
            page.press_key(PASSWORD_SELECTOR, "Enter").await?;
        }

        let navigated = page.wait_for_navigation(self.navigation_timeout).await?;
        debug!(navigated, "login submitted");
        Ok(())
    }
}
