use std::rc::Rc;

use crate::settings::{SettingsStore, USERNAME_KEY};

/// Display name entered on the page, written through to settings on every
/// change.
pub struct UserProfile<S> {
    store: Rc<S>,
    display_name: String,
}

impl<S: SettingsStore> UserProfile<S> {
    /// Restores the stored name, or starts blank when none was ever entered.
    pub fn load(store: Rc<S>) -> Self {
        let display_name = store.get(USERNAME_KEY).unwrap_or_default();
        Self {
            store,
            display_name,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
        self.store.set(USERNAME_KEY, &self.display_name);
        tracing::debug!(len = self.display_name.len(), "display name updated");
    }

    pub fn greeting(&self) -> String {
        format!("Hello, {}!", self.display_name)
    }
}
