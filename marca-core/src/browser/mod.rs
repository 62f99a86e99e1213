mod automation;
mod error;
mod page;

pub use automation::{bounded, teardown, ChromiumPage, ChromiumSession, SessionLauncher};
pub use error::{CheckError, CheckResult};
pub use page::{AutomationPage, AutomationSession, NavigationOutcome, SessionFactory};
