// Notifier module: permission-gated alerts for notable predictions.

pub mod desktop;

pub use desktop::{DesktopNotifier, Permission};

use crate::event_log::Severity;
use crate::model::NotifyError;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str, severity: Severity) -> Result<(), NotifyError>;
}
