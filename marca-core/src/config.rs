use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub registry: RegistrySection,
    pub handles: HandleSection,
    pub chromium: ChromiumSection,
    pub timeouts: TimeoutSection,
    pub observability: ObservabilitySection,
}

impl CheckerConfig {
    /// Rejects values the pipelines cannot work with before any browser is
    /// launched.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.registry.search_url).map_err(|err| {
            ConfigError::Invalid(format!(
                "registry.search_url `{}`: {err}",
                self.registry.search_url
            ))
        })?;
        Url::parse(&self.handles.profile_base_url).map_err(|err| {
            ConfigError::Invalid(format!(
                "handles.profile_base_url `{}`: {err}",
                self.handles.profile_base_url
            ))
        })?;
        if self.registry.poll_attempts == 0 {
            return Err(ConfigError::Invalid(
                "registry.poll_attempts must be at least 1".into(),
            ));
        }
        if self.handles.max_concurrent_pages == 0 {
            return Err(ConfigError::Invalid(
                "handles.max_concurrent_pages must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    pub search_url: String,
    pub credentials: Option<RegistryCredentials>,
    pub poll_attempts: usize,
    pub poll_delay_ms: u64,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            search_url: "https://busca.inpi.gov.br/pePI/jsp/marcas/Pesquisa_classe_basica.jsp"
                .to_string(),
            credentials: None,
            poll_attempts: 5,
            poll_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandleSection {
    pub profile_base_url: String,
    pub max_concurrent_pages: usize,
}

impl Default for HandleSection {
    fn default() -> Self {
        Self {
            profile_base_url: "https://www.instagram.com".to_string(),
            max_concurrent_pages: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChromiumSection {
    pub executable_path: Option<String>,
    pub headless: bool,
    pub sandbox: bool,
    pub disable_gpu: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
}

impl Default for ChromiumSection {
    fn default() -> Self {
        Self {
            executable_path: None,
            headless: true,
            sandbox: false,
            disable_gpu: true,
            window_width: 1280,
            window_height: 800,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub navigation_secs: u64,
    pub results_wait_secs: u64,
    pub results_settle_ms: u64,
    pub check_deadline_secs: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            navigation_secs: 30,
            results_wait_secs: 20,
            results_settle_ms: 3000,
            check_deadline_secs: 240,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilitySection {
    pub screenshot_dir: String,
}

impl Default for ObservabilitySection {
    fn default() -> Self {
        Self {
            screenshot_dir: "diagnostics".to_string(),
        }
    }
}

pub fn load_checker_config<P: AsRef<Path>>(path: P) -> Result<CheckerConfig> {
    let config: CheckerConfig = load_toml(path)?;
    config.validate()?;
    Ok(config)
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
