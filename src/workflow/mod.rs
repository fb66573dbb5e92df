use std::rc::Rc;

use crate::capture::{CaptureResult, MediaAcquirer, MediaSource, ResourceHandle};
use crate::notification::Notifier;
use crate::render::{decode_image, RenderableImage};
use crate::settings::{SettingsStore, PHOTO_KEY};
use crate::state::{PhotoEvent, PhotoState, PhotoStateMachine, StateTransition};
use crate::storage::ResourceOpener;

mod error;

pub use error::{CommitError, CommitResult, PhotoError, ReloadError, ReloadResult};

pub const NO_PHOTO_TAKEN: &str = "No photo taken.";

/// Stored locator of the current photo. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoReference {
    path: String,
}

impl PhotoReference {
    /// An empty path is the same as no reference at all.
    pub fn new(path: impl Into<String>) -> Option<Self> {
        let path = path.into();
        if path.is_empty() {
            None
        } else {
            Some(Self { path })
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Result of a capture or pick flow started by the user.
#[derive(Debug)]
pub enum PhotoOutcome {
    Committed(RenderableImage),
    Canceled,
    Failed(PhotoError),
}

impl PhotoOutcome {
    pub fn image(&self) -> Option<&RenderableImage> {
        match self {
            Self::Committed(image) => Some(image),
            _ => None,
        }
    }
}

/// Drives the photo slot: acquisition, commit into settings, reload on the
/// next visit, and clearing of references that stopped resolving.
///
/// Each operation is an independent unit of work; the settings store is the
/// only state shared between calls.
pub struct PhotoWorkflow<S, A, R, N> {
    store: Rc<S>,
    acquirer: A,
    opener: R,
    notifier: N,
    machine: PhotoStateMachine,
}

impl<S, A, R, N> PhotoWorkflow<S, A, R, N>
where
    S: SettingsStore,
    A: MediaAcquirer,
    R: ResourceOpener,
    N: Notifier,
{
    pub fn new(store: Rc<S>, acquirer: A, opener: R, notifier: N) -> Self {
        Self {
            store,
            acquirer,
            opener,
            notifier,
            machine: PhotoStateMachine::new(),
        }
    }

    pub fn state(&self) -> PhotoState {
        self.machine.state()
    }

    pub fn history(&self) -> &[StateTransition] {
        self.machine.history()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn acquirer(&self) -> &A {
        &self.acquirer
    }

    pub fn opener(&self) -> &R {
        &self.opener
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn stored_reference(&self) -> Option<PhotoReference> {
        self.store.get(PHOTO_KEY).and_then(PhotoReference::new)
    }

    /// Page-load decision: reload whatever is stored, or stay empty.
    pub async fn startup(&mut self) -> Option<RenderableImage> {
        match self.stored_reference() {
            Some(reference) => self.reload(reference.path()).await.ok(),
            None => {
                self.machine.transition(PhotoEvent::NothingStored);
                None
            }
        }
    }

    /// Asks the host collaborator for a photo. `Ok(None)` when dismissed.
    pub async fn acquire(&self, source: MediaSource) -> CaptureResult<Option<ResourceHandle>> {
        let handle = self.acquirer.acquire(&source.request()).await?;
        match &handle {
            Some(handle) => tracing::debug!(?source, locator = handle.locator(), "acquired photo"),
            None => tracing::debug!(?source, "photo acquisition dismissed"),
        }
        Ok(handle)
    }

    /// Decodes the handle and only then stores its locator.
    pub async fn commit(&mut self, handle: &ResourceHandle) -> CommitResult<RenderableImage> {
        let locator = handle.locator();
        let bytes = self.opener.open(locator).await?;
        let image = decode_image(locator, &bytes)?;

        self.store.set(PHOTO_KEY, locator);
        self.machine.transition(PhotoEvent::Committed);
        tracing::info!(
            locator,
            width = image.width(),
            height = image.height(),
            "photo committed"
        );
        Ok(image)
    }

    /// Rebuilds the image from a stored locator. Any failure clears the
    /// stored reference and notifies the user; there is no retry.
    pub async fn reload(&mut self, stored_path: &str) -> ReloadResult<RenderableImage> {
        match self.resolve(stored_path).await {
            Ok(image) => {
                self.machine.transition(PhotoEvent::Reloaded);
                Ok(image)
            }
            Err(err) => {
                self.machine.transition(PhotoEvent::ReloadFailed);
                self.store.remove(PHOTO_KEY);
                tracing::warn!(stored_path, %err, "cleared stale photo reference");
                self.notify_user(&err.to_string());
                Err(err)
            }
        }
    }

    async fn resolve(&self, locator: &str) -> ReloadResult<RenderableImage> {
        let bytes = self.opener.open(locator).await?;
        Ok(decode_image(locator, &bytes)?)
    }

    pub fn notify_user(&self, message: &str) {
        self.notifier.notify_user(message);
    }

    /// Camera flow. Dismissing the camera is reported as "No photo taken."
    pub async fn take_photo(&mut self) -> PhotoOutcome {
        match self.acquire(MediaSource::Capture).await {
            Ok(Some(handle)) => self.commit_and_report(&handle).await,
            Ok(None) => {
                self.notify_user(NO_PHOTO_TAKEN);
                PhotoOutcome::Canceled
            }
            Err(err) => self.report_failure(err.into()),
        }
    }

    /// Picker flow. Dismissing the picker is silent.
    pub async fn select_photo(&mut self) -> PhotoOutcome {
        match self.acquire(MediaSource::Pick).await {
            Ok(Some(handle)) => self.commit_and_report(&handle).await,
            Ok(None) => PhotoOutcome::Canceled,
            Err(err) => self.report_failure(err.into()),
        }
    }

    async fn commit_and_report(&mut self, handle: &ResourceHandle) -> PhotoOutcome {
        match self.commit(handle).await {
            Ok(image) => PhotoOutcome::Committed(image),
            Err(err) => self.report_failure(err.into()),
        }
    }

    fn report_failure(&self, err: PhotoError) -> PhotoOutcome {
        tracing::warn!(%err, "photo flow failed");
        self.notify_user(&err.to_string());
        PhotoOutcome::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use image::ImageFormat;

    use super::*;
    use crate::capture::CaptureError;
    use crate::render::fixtures::encoded_image;
    use crate::render::DecodeError;
    use crate::settings::MemorySettingsStore;
    use crate::storage::ResolutionError;
    use crate::testing::{FakeResources, RecordingNotifier, ScriptedAcquirer};

    type TestWorkflow =
        PhotoWorkflow<MemorySettingsStore, ScriptedAcquirer, FakeResources, RecordingNotifier>;

    fn workflow() -> TestWorkflow {
        PhotoWorkflow::new(
            Rc::new(MemorySettingsStore::new()),
            ScriptedAcquirer::default(),
            FakeResources::default(),
            RecordingNotifier::default(),
        )
    }

    fn jpeg() -> Vec<u8> {
        encoded_image(32, 18, ImageFormat::Jpeg)
    }

    #[tokio::test]
    async fn commit_then_reload_round_trips_through_the_store() {
        let mut workflow = workflow();
        workflow.opener().put("/pics/a.jpg", jpeg());

        let committed = workflow
            .commit(&ResourceHandle::new("/pics/a.jpg"))
            .await
            .expect("valid image should commit");
        assert_eq!(committed.dimensions(), (32, 18));
        assert_eq!(workflow.state(), PhotoState::Loaded);

        let stored = workflow.stored_reference().expect("reference stored");
        assert_eq!(stored.path(), "/pics/a.jpg");
        let reloaded = workflow.reload(stored.path()).await.expect("reload");
        assert_eq!(reloaded.dimensions(), committed.dimensions());
        assert!(workflow.notifier().messages().is_empty());
    }

    #[tokio::test]
    async fn reload_of_valid_reference_leaves_store_unchanged() {
        let mut workflow = workflow();
        workflow.opener().put("/pics/a.jpg", jpeg());
        workflow.store().set(PHOTO_KEY, "/pics/a.jpg");

        let image = workflow.startup().await.expect("stored photo should load");
        assert_eq!(image.locator(), "/pics/a.jpg");
        assert_eq!(workflow.state(), PhotoState::Loaded);
        assert_eq!(
            workflow.store().get(PHOTO_KEY).as_deref(),
            Some("/pics/a.jpg")
        );
    }

    #[tokio::test]
    async fn reload_of_missing_resource_clears_reference_and_notifies() {
        let mut workflow = workflow();
        workflow.store().set(PHOTO_KEY, "/pics/missing.jpg");

        let err = workflow
            .reload("/pics/missing.jpg")
            .await
            .expect_err("missing file cannot reload");
        assert!(matches!(
            err,
            ReloadError::Resolution(ResolutionError::NotFound { .. })
        ));
        assert_eq!(workflow.state(), PhotoState::Broken);
        assert!(!workflow.store().has(PHOTO_KEY));

        let messages = workflow.notifier().messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("not found"));
        assert!(messages[0].contains("/pics/missing.jpg"));
    }

    #[tokio::test]
    async fn deleting_a_committed_resource_self_heals_on_next_reload() {
        let mut workflow = workflow();
        workflow.opener().put("/pics/a.jpg", jpeg());
        workflow
            .commit(&ResourceHandle::new("/pics/a.jpg"))
            .await
            .expect("commit");

        workflow.opener().delete("/pics/a.jpg");
        assert!(workflow.startup().await.is_none());
        assert_eq!(workflow.state(), PhotoState::Broken);
        assert!(!workflow.store().has(PHOTO_KEY));

        assert!(workflow.startup().await.is_none());
        assert_eq!(workflow.state(), PhotoState::Broken);
        assert_eq!(workflow.notifier().messages().len(), 1);
    }

    #[tokio::test]
    async fn reload_clears_reference_when_access_is_denied() {
        let mut workflow = workflow();
        workflow.opener().put("/pics/locked.jpg", jpeg());
        workflow.opener().deny("/pics/locked.jpg");
        workflow.store().set(PHOTO_KEY, "/pics/locked.jpg");

        assert!(workflow.startup().await.is_none());
        assert!(!workflow.store().has(PHOTO_KEY));
        assert_eq!(
            workflow.notifier().messages(),
            vec!["access denied: /pics/locked.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn reload_clears_reference_when_content_no_longer_decodes() {
        let mut workflow = workflow();
        workflow.opener().put("/pics/a.jpg", b"overwritten with text".to_vec());
        workflow.store().set(PHOTO_KEY, "/pics/a.jpg");

        let err = workflow.reload("/pics/a.jpg").await.expect_err("not an image");
        assert!(matches!(err, ReloadError::Decode(_)));
        assert_eq!(workflow.state(), PhotoState::Broken);
        assert!(!workflow.store().has(PHOTO_KEY));
    }

    #[tokio::test]
    async fn startup_treats_empty_and_absent_references_alike() {
        let mut absent = workflow();
        let mut empty = workflow();
        empty.store().set(PHOTO_KEY, "");

        assert!(absent.startup().await.is_none());
        assert!(empty.startup().await.is_none());

        assert_eq!(absent.state(), PhotoState::Empty);
        assert_eq!(empty.state(), absent.state());
        assert!(absent.opener().opened().is_empty());
        assert!(empty.opener().opened().is_empty());
        assert!(empty.notifier().messages().is_empty());
        assert_eq!(empty.store().get(PHOTO_KEY).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn commit_propagates_decode_error_without_touching_store() {
        let mut workflow = workflow();
        workflow.store().set(PHOTO_KEY, "/pics/previous.jpg");
        workflow.opener().put("/pics/notes.png", b"plain text".to_vec());

        let err = workflow
            .commit(&ResourceHandle::new("/pics/notes.png"))
            .await
            .expect_err("text is not an image");
        assert!(matches!(
            err,
            CommitError::Decode(DecodeError::UnknownFormat { .. })
        ));
        assert_eq!(
            workflow.store().get(PHOTO_KEY).as_deref(),
            Some("/pics/previous.jpg")
        );
        assert_eq!(workflow.state(), PhotoState::Empty);
        assert!(workflow.notifier().messages().is_empty());
    }

    #[tokio::test]
    async fn commit_of_missing_resource_leaves_store_and_state_alone() {
        let mut workflow = workflow();
        workflow.store().set(PHOTO_KEY, "/pics/previous.jpg");

        let err = workflow
            .commit(&ResourceHandle::new("/pics/gone.jpg"))
            .await
            .expect_err("missing file cannot commit");
        assert!(matches!(
            err,
            CommitError::Open(ResolutionError::NotFound { .. })
        ));
        assert_eq!(
            workflow.store().get(PHOTO_KEY).as_deref(),
            Some("/pics/previous.jpg")
        );
        assert_eq!(workflow.state(), PhotoState::Empty);
        assert!(workflow.history().is_empty());
        assert!(workflow.notifier().messages().is_empty());
    }

    #[tokio::test]
    async fn select_photo_with_denied_file_reports_open_failure() {
        let mut workflow = workflow();
        workflow.opener().put("/pics/locked.png", encoded_image(4, 4, ImageFormat::Png));
        workflow.opener().deny("/pics/locked.png");
        workflow
            .acquirer()
            .push(Ok(Some(ResourceHandle::new("/pics/locked.png"))));

        let outcome = workflow.select_photo().await;
        assert!(matches!(
            outcome,
            PhotoOutcome::Failed(PhotoError::Commit(CommitError::Open(
                ResolutionError::AccessDenied { .. }
            )))
        ));
        assert!(!workflow.store().has(PHOTO_KEY));
        assert_eq!(workflow.state(), PhotoState::Empty);
        assert_eq!(
            workflow.notifier().messages(),
            vec!["access denied: /pics/locked.png".to_string()]
        );
    }

    #[tokio::test]
    async fn take_photo_cancel_reports_no_photo_and_keeps_store() {
        let mut workflow = workflow();
        workflow.acquirer().push(Ok(None));

        let outcome = workflow.take_photo().await;
        assert!(matches!(outcome, PhotoOutcome::Canceled));
        assert_eq!(workflow.notifier().messages(), vec![NO_PHOTO_TAKEN.to_string()]);
        assert!(!workflow.store().has(PHOTO_KEY));

        let requests = workflow.acquirer().requests();
        assert_eq!(requests, vec![MediaSource::Capture.request()]);
    }

    #[tokio::test]
    async fn take_photo_cancel_does_not_remove_existing_reference() {
        let mut workflow = workflow();
        workflow.store().set(PHOTO_KEY, "/pics/a.jpg");
        workflow.acquirer().push(Ok(None));

        workflow.take_photo().await;
        assert_eq!(workflow.store().get(PHOTO_KEY).as_deref(), Some("/pics/a.jpg"));
    }

    #[tokio::test]
    async fn take_photo_failure_is_reported_to_user() {
        let mut workflow = workflow();
        workflow.acquirer().push(Err(CaptureError::CommandFailed {
            command: "fswebcam".to_string(),
            message: "no camera attached".to_string(),
        }));

        let outcome = workflow.take_photo().await;
        assert!(matches!(
            outcome,
            PhotoOutcome::Failed(PhotoError::Capture(CaptureError::CommandFailed { .. }))
        ));
        let messages = workflow.notifier().messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("no camera attached"));
        assert_eq!(workflow.state(), PhotoState::Empty);
    }

    #[tokio::test]
    async fn take_photo_commits_captured_frame() {
        let mut workflow = workflow();
        workflow.opener().put("/captures/frame.jpg", jpeg());
        workflow
            .acquirer()
            .push(Ok(Some(ResourceHandle::new("/captures/frame.jpg"))));

        let outcome = workflow.take_photo().await;
        let image = outcome.image().expect("frame should be committed");
        assert_eq!(image.locator(), "/captures/frame.jpg");
        assert_eq!(
            workflow.store().get(PHOTO_KEY).as_deref(),
            Some("/captures/frame.jpg")
        );
        assert!(workflow.notifier().messages().is_empty());
    }

    #[tokio::test]
    async fn select_photo_cancel_is_silent() {
        let mut workflow = workflow();
        workflow.acquirer().push(Ok(None));

        let outcome = workflow.select_photo().await;
        assert!(matches!(outcome, PhotoOutcome::Canceled));
        assert!(workflow.notifier().messages().is_empty());
        assert!(!workflow.store().has(PHOTO_KEY));
        assert_eq!(
            workflow.acquirer().requests(),
            vec![MediaSource::Pick.request()]
        );
    }

    #[tokio::test]
    async fn select_photo_with_undecodable_file_notifies_and_keeps_store() {
        let mut workflow = workflow();
        workflow.opener().put("/pics/fake.png", b"not a png".to_vec());
        workflow
            .acquirer()
            .push(Ok(Some(ResourceHandle::new("/pics/fake.png"))));

        let outcome = workflow.select_photo().await;
        assert!(matches!(
            outcome,
            PhotoOutcome::Failed(PhotoError::Commit(CommitError::Decode(_)))
        ));
        assert!(!workflow.store().has(PHOTO_KEY));
        assert_eq!(workflow.notifier().messages().len(), 1);
    }

    #[tokio::test]
    async fn later_selection_overwrites_stored_reference() {
        let mut workflow = workflow();
        workflow.opener().put("/pics/a.jpg", jpeg());
        workflow
            .opener()
            .put("/pics/b.png", encoded_image(4, 4, ImageFormat::Png));
        workflow.acquirer().push(Ok(Some(ResourceHandle::new("/pics/a.jpg"))));
        workflow.acquirer().push(Ok(Some(ResourceHandle::new("/pics/b.png"))));

        workflow.select_photo().await;
        workflow.select_photo().await;

        assert_eq!(workflow.store().get(PHOTO_KEY).as_deref(), Some("/pics/b.png"));
        assert_eq!(workflow.state(), PhotoState::Loaded);
        assert_eq!(workflow.history().len(), 2);
    }

    #[test]
    fn photo_reference_rejects_empty_path() {
        assert!(PhotoReference::new("").is_none());
        assert_eq!(
            PhotoReference::new("/pics/a.jpg").map(|r| r.path().to_string()),
            Some("/pics/a.jpg".to_string())
        );
    }
}
