use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::storage::{StorageError, StorageService};

const PICK_DIALOG_TITLE: &str = "Select a photo";
const PICK_FILTER_NAME: &str = "Images";
const OUTPUT_PLACEHOLDER: &str = "{output}";
const RESOLUTION_PLACEHOLDER: &str = "{resolution}";
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Extensions accepted by the picker.
pub const PHOTO_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    Capture,
    Pick,
}

impl MediaSource {
    /// Collaborator configuration used for this source.
    pub fn request(self) -> AcquireRequest {
        match self {
            Self::Capture => AcquireRequest::Capture(CaptureOptions::default()),
            Self::Pick => AcquireRequest::Pick(PickOptions::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Photo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const WIDESCREEN: Self = Self {
        width: 16,
        height: 9,
    };

    /// Frame size with the given height, width rounded down to an even value.
    pub fn resolution_for_height(self, height: u32) -> (u32, u32) {
        let height = height.max(1);
        let width = u64::from(height) * u64::from(self.width) / u64::from(self.height.max(1));
        let width = (width as u32).max(2) & !1;
        (width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub mode: CaptureMode,
    pub aspect_ratio: AspectRatio,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Photo,
            aspect_ratio: AspectRatio::WIDESCREEN,
        }
    }
}

/// Host dialogs pick their own layout; the view mode is a hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerViewMode {
    Thumbnail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerLocation {
    PicturesLibrary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOptions {
    pub view_mode: PickerViewMode,
    pub start_location: PickerLocation,
    pub allowed_extensions: Vec<String>,
}

impl PickOptions {
    pub fn allows(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.allowed_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            view_mode: PickerViewMode::Thumbnail,
            start_location: PickerLocation::PicturesLibrary,
            allowed_extensions: PHOTO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireRequest {
    Capture(CaptureOptions),
    Pick(PickOptions),
}

/// Opaque reference to a captured or picked item. Only its locator is
/// meaningful outside the collaborator that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    locator: String,
}

impl ResourceHandle {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy().into_owned())
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },
    #[error("camera command io error: {command}: {source}")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid capture artifact: {message}")]
    InvalidCaptureArtifact { message: String },
    #[error("unsupported file type: {}", path.display())]
    UnsupportedFileType { path: PathBuf },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Host-provided capture and pick dialogs.
///
/// `Ok(None)` means the user dismissed the dialog; errors are reserved for
/// hardware, permission or I/O failures.
pub trait MediaAcquirer {
    fn acquire(
        &self,
        request: &AcquireRequest,
    ) -> impl Future<Output = CaptureResult<Option<ResourceHandle>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    pub command: String,
    pub args: Vec<String>,
    pub frame_height: u32,
}

impl CameraSettings {
    fn expand_args(&self, resolution: &str, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        let mut saw_output = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                saw_output |= arg.contains(OUTPUT_PLACEHOLDER);
                arg.replace(RESOLUTION_PLACEHOLDER, resolution)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect();
        if !saw_output {
            args.push(output.into_owned());
        }
        args
    }
}

/// Camera via an external command and picking via the desktop file dialog.
#[derive(Debug, Clone)]
pub struct SystemMediaAcquirer {
    storage: StorageService,
    camera: CameraSettings,
}

impl SystemMediaAcquirer {
    pub fn new(storage: StorageService, camera: CameraSettings) -> Self {
        Self { storage, camera }
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    async fn capture_photo(
        &self,
        options: &CaptureOptions,
    ) -> CaptureResult<Option<ResourceHandle>> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|err| {
            CaptureError::InvalidCaptureArtifact {
                message: format!("system time before unix epoch: {err}"),
            }
        })?;
        let output = self
            .storage
            .allocate_capture_path(&now.as_nanos().to_string())?;

        let (width, height) = options
            .aspect_ratio
            .resolution_for_height(self.camera.frame_height);
        let args = self.camera.expand_args(&format!("{width}x{height}"), &output);
        tracing::debug!(
            command = %self.camera.command,
            ?args,
            mode = ?options.mode,
            "starting camera capture"
        );

        let status = match tokio::process::Command::new(&self.camera.command)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
        {
            Ok(status) => status,
            Err(err) => {
                cleanup_capture_file(&self.storage, &output, "camera spawn failure");
                return Err(CaptureError::CommandIo {
                    command: self.camera.command.clone(),
                    source: err,
                });
            }
        };

        match classify_camera_exit(status.code(), &output) {
            CameraExit::Captured => {
                tracing::info!(path = %output.display(), "camera capture complete");
                Ok(Some(ResourceHandle::from_path(&output)))
            }
            CameraExit::Canceled => {
                tracing::info!(?status, "camera capture dismissed");
                cleanup_capture_file(&self.storage, &output, "camera capture dismissed");
                Ok(None)
            }
            CameraExit::Failed => {
                cleanup_capture_file(&self.storage, &output, "camera command failure");
                Err(CaptureError::CommandFailed {
                    command: self.camera.command.clone(),
                    message: format!("command exited with status: {status}"),
                })
            }
        }
    }

    async fn pick_photo(&self, options: &PickOptions) -> CaptureResult<Option<ResourceHandle>> {
        let extensions: Vec<&str> = options
            .allowed_extensions
            .iter()
            .map(String::as_str)
            .collect();
        let mut dialog = rfd::AsyncFileDialog::new()
            .set_title(PICK_DIALOG_TITLE)
            .add_filter(PICK_FILTER_NAME, extensions.as_slice());
        match options.start_location {
            PickerLocation::PicturesLibrary => {
                dialog = dialog.set_directory(self.storage.pictures_dir());
            }
        }

        let Some(file) = dialog.pick_file().await else {
            tracing::info!("photo picker dismissed");
            return Ok(None);
        };
        let path = file.path().to_path_buf();
        if !options.allows(&path) {
            return Err(CaptureError::UnsupportedFileType { path });
        }
        tracing::info!(path = %path.display(), "photo picked");
        Ok(Some(ResourceHandle::from_path(&path)))
    }
}

impl MediaAcquirer for SystemMediaAcquirer {
    async fn acquire(&self, request: &AcquireRequest) -> CaptureResult<Option<ResourceHandle>> {
        match request {
            AcquireRequest::Capture(options) => self.capture_photo(options).await,
            AcquireRequest::Pick(options) => self.pick_photo(options).await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CameraExit {
    Captured,
    Canceled,
    Failed,
}

/// Signal termination, an interrupt exit code or an empty frame count as the
/// user backing out of the capture.
fn classify_camera_exit(code: Option<i32>, output: &Path) -> CameraExit {
    match code {
        Some(0) => {
            let captured = std::fs::metadata(output)
                .map(|metadata| metadata.is_file() && metadata.len() > 0)
                .unwrap_or(false);
            if captured {
                CameraExit::Captured
            } else {
                CameraExit::Canceled
            }
        }
        None | Some(INTERRUPTED_EXIT_CODE) => CameraExit::Canceled,
        Some(_) => CameraExit::Failed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureCleanupOutcome {
    Removed,
    Failed,
}

fn cleanup_capture_file(
    storage: &StorageService,
    path: &Path,
    stage: &str,
) -> CaptureCleanupOutcome {
    cleanup_capture_file_with(path, stage, |path| storage.discard_capture(path))
}

fn cleanup_capture_file_with<F>(path: &Path, stage: &str, remove_file: F) -> CaptureCleanupOutcome
where
    F: FnOnce(&Path) -> Result<(), StorageError>,
{
    match remove_file(path) {
        Ok(()) => CaptureCleanupOutcome::Removed,
        Err(err) => {
            tracing::warn!(
                stage = stage,
                path = %path.display(),
                ?err,
                "failed to cleanup partial capture file"
            );
            CaptureCleanupOutcome::Failed
        }
    }
}
