use crate::event_log::{EventLog, Severity};
use crate::model::NotifyError;
use crate::notifier::Notifier;
use std::sync::Arc;
use std::sync::Mutex;
use tracing::info;

/// Notification permission handshake. `NotAsked` resolves on first use; a
/// headless build has no user prompt to wait on, so it resolves to `Granted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Unsupported,
    NotAsked,
    Granted,
    Denied,
}

/// Desktop-style notifier. Writes granted notifications through the event
/// log; a no-op error when unsupported or denied.
pub struct DesktopNotifier {
    permission: Mutex<Permission>,
    log: Arc<EventLog>,
}

impl DesktopNotifier {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self::with_permission(log, Permission::NotAsked)
    }

    pub fn with_permission(log: Arc<EventLog>, permission: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            log,
        }
    }

    fn resolve_permission(&self) -> Permission {
        let mut permission = self.permission.lock().expect("permission mutex poisoned");
        if *permission == Permission::NotAsked {
            *permission = Permission::Granted;
        }
        *permission
    }
}

#[async_trait::async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, body: &str, severity: Severity) -> Result<(), NotifyError> {
        match self.resolve_permission() {
            Permission::Unsupported => Err(NotifyError::Unsupported),
            Permission::Denied => Err(NotifyError::Denied),
            Permission::Granted | Permission::NotAsked => {
                info!("🔔 {title}: {body}");
                self.log.log(format!("{title} — {body}"), severity);
                Ok(())
            }
        }
    }
}
