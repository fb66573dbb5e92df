use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::capture::MediaAcquirer;
use crate::notification::Notifier;
use crate::profile::UserProfile;
use crate::render::RenderableImage;
use crate::settings::SettingsStore;
use crate::state::PhotoState;
use crate::storage::ResourceOpener;
use crate::workflow::{PhotoOutcome, PhotoWorkflow};

/// Session-only page state, restored when the page is revisited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStateSnapshot {
    #[serde(
        rename = "greetingOutputText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub greeting_output_text: Option<String>,
}

/// The profile page: greeting, display name and photo slot.
///
/// Components are injected once at construction; nothing is looked up
/// through process-wide state.
pub struct MainPage<S, A, R, N> {
    store: Rc<S>,
    profile: UserProfile<S>,
    workflow: PhotoWorkflow<S, A, R, N>,
    greeting_output: String,
    photo: Option<RenderableImage>,
}

impl<S, A, R, N> MainPage<S, A, R, N>
where
    S: SettingsStore,
    A: MediaAcquirer,
    R: ResourceOpener,
    N: Notifier,
{
    pub fn new(store: Rc<S>, acquirer: A, opener: R, notifier: N) -> Self {
        Self {
            profile: UserProfile::load(Rc::clone(&store)),
            workflow: PhotoWorkflow::new(Rc::clone(&store), acquirer, opener, notifier),
            store,
            greeting_output: String::new(),
            photo: None,
        }
    }

    /// Restores the session snapshot, then the durable name and photo.
    pub async fn load_state(&mut self, snapshot: Option<&PageStateSnapshot>) {
        if let Some(text) = snapshot.and_then(|s| s.greeting_output_text.as_ref()) {
            self.greeting_output = text.clone();
        }

        self.profile = UserProfile::load(Rc::clone(&self.store));
        self.photo = self.workflow.startup().await;
        tracing::debug!(
            photo_state = ?self.workflow.state(),
            has_greeting = !self.greeting_output.is_empty(),
            "page state loaded"
        );
    }

    pub fn save_state(&self) -> PageStateSnapshot {
        PageStateSnapshot {
            greeting_output_text: Some(self.greeting_output.clone()),
        }
    }

    pub fn display_name(&self) -> &str {
        self.profile.display_name()
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.profile.set_display_name(name);
    }

    pub fn greet(&mut self) -> &str {
        self.greeting_output = self.profile.greeting();
        &self.greeting_output
    }

    pub fn greeting_output(&self) -> &str {
        &self.greeting_output
    }

    pub fn photo(&self) -> Option<&RenderableImage> {
        self.photo.as_ref()
    }

    pub fn photo_state(&self) -> PhotoState {
        self.workflow.state()
    }

    pub fn workflow(&self) -> &PhotoWorkflow<S, A, R, N> {
        &self.workflow
    }

    pub async fn take_photo(&mut self) -> PhotoOutcome {
        let outcome = self.workflow.take_photo().await;
        self.show(&outcome);
        outcome
    }

    pub async fn select_photo(&mut self) -> PhotoOutcome {
        let outcome = self.workflow.select_photo().await;
        self.show(&outcome);
        outcome
    }

    pub fn process_query_text(&self, query_text: &str) {
        self.workflow.notify_user(&format!(
            "Someone is searching this app for : \"{query_text}\""
        ));
    }

    fn show(&mut self, outcome: &PhotoOutcome) {
        if let Some(image) = outcome.image() {
            self.photo = Some(image.clone());
        }
    }
}
