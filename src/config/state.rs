//! Application state module
//!
//! Built once at startup and shared read-only by every request

use std::sync::Arc;

use super::types::Config;
use crate::intake::RedirectTargets;
use crate::mail::{MailError, MandrillNotifier, Notifier};
use crate::storage::{MySqlStore, SubmissionStore};

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SubmissionStore>,
    /// Present only when `mail.enabled`
    pub notifier: Option<Arc<dyn Notifier>>,
    pub redirect_targets: Option<RedirectTargets>,
}

impl AppState {
    /// Create `AppState` with the MySQL store and, if enabled, the Mandrill notifier
    pub fn new(config: Config) -> Result<Self, MailError> {
        let store: Arc<dyn SubmissionStore> = Arc::new(MySqlStore::new(&config.database));
        let notifier: Option<Arc<dyn Notifier>> = if config.mail.enabled {
            Some(Arc::new(MandrillNotifier::from_config(&config.mail)?))
        } else {
            None
        };

        Ok(Self::with_parts(config, store, notifier))
    }

    /// Assemble state from already-built collaborators
    pub fn with_parts(
        config: Config,
        store: Arc<dyn SubmissionStore>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let redirect_targets = RedirectTargets::from_config(&config.redirect);
        Self {
            config,
            store,
            notifier,
            redirect_targets,
        }
    }
}
