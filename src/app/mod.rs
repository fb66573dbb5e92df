use std::rc::Rc;

use crate::capture::{CameraSettings, SystemMediaAcquirer};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::notification::DesktopNotifier;
use crate::page::MainPage;
use crate::render::RenderableImage;
use crate::settings::JsonSettingsStore;
use crate::state::PhotoState;
use crate::storage::{FsResourceOpener, StorageService};
use crate::workflow::PhotoOutcome;

mod command;

pub use command::{parse_command, Command, CommandError, USAGE};

pub type SystemPage =
    MainPage<JsonSettingsStore, SystemMediaAcquirer, FsResourceOpener, DesktopNotifier>;

/// Wires the page to the desktop collaborators described by `config.json`.
pub struct App {
    page: SystemPage,
}

impl App {
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let store = match &config.settings_path {
            Some(path) => JsonSettingsStore::open(path),
            None => JsonSettingsStore::open_default()?,
        };
        let storage = StorageService::with_default_paths(config.captures_dir.clone())?;
        let camera = CameraSettings {
            command: config.camera_command.clone(),
            args: config.camera_args.clone(),
            frame_height: config.capture_frame_height,
        };
        tracing::debug!(
            settings = %store.path().display(),
            captures = %storage.captures_dir().display(),
            "app collaborators configured"
        );

        let page = MainPage::new(
            Rc::new(store),
            SystemMediaAcquirer::new(storage, camera),
            FsResourceOpener,
            DesktopNotifier::new(config.notifications),
        );
        Ok(Self { page })
    }

    pub fn page(&self) -> &SystemPage {
        &self.page
    }

    /// Loads the page as a fresh visit, runs `command` and returns the text
    /// to print. `Help` does not touch the page.
    pub async fn execute(&mut self, command: Command) -> String {
        if command != Command::Help {
            self.page.load_state(None).await;
        }

        match command {
            Command::Help => USAGE.to_string(),
            Command::Show => {
                describe_page(self.page.display_name(), self.page.photo_state(), self.page.photo())
            }
            Command::Name(name) => {
                self.page.set_display_name(name);
                format!("name: {}", self.page.display_name())
            }
            Command::Greet => self.page.greet().to_string(),
            Command::Capture => describe_outcome(&self.page.take_photo().await),
            Command::Pick => describe_outcome(&self.page.select_photo().await),
            Command::Search(query) => {
                self.page.process_query_text(&query);
                format!("search: {query}")
            }
        }
    }

    /// Waits for desktop notifications still being delivered.
    pub fn flush_notifications(&self) {
        self.page.workflow().notifier().flush();
    }
}

fn describe_page(name: &str, state: PhotoState, photo: Option<&RenderableImage>) -> String {
    let name = if name.is_empty() { "(not set)" } else { name };
    let photo = match (state, photo) {
        (PhotoState::Loaded, Some(image)) => describe_image(image),
        (PhotoState::Broken, _) => "stored photo could not be loaded and was cleared".to_string(),
        _ => "(none)".to_string(),
    };
    format!("name: {name}\nphoto: {photo}")
}

fn describe_image(image: &RenderableImage) -> String {
    let (width, height) = image.dimensions();
    format!("{} ({width}x{height})", image.locator())
}

fn describe_outcome(outcome: &PhotoOutcome) -> String {
    match outcome {
        PhotoOutcome::Committed(image) => format!("photo: {}", describe_image(image)),
        PhotoOutcome::Canceled => "photo: unchanged".to_string(),
        PhotoOutcome::Failed(err) => format!("photo: failed: {err}"),
    }
}
