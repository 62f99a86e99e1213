use thiserror::Error;

pub type CheckResult<T> = Result<T, CheckError>;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("chromium launch failed: {0}")]
    Launch(String),
    #[error("cdp error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("navigation timed out: {0}")]
    NavigationTimeout(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("search form not found: {0}")]
    FormNotFound(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("unrecognized page state: {0}")]
    UnknownPageState(String),
    #[error("timeout waiting for {0}")]
    Timeout(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}
