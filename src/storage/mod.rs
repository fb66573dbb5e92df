use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

const CAPTURE_PREFIX: &str = "capture_";
const CAPTURE_EXTENSION: &str = "jpg";
const PICTURES_SUBDIR: &str = "Pictures";
const CAPTURES_SUBDIR: &str = "keepsake";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Failure to turn a stored locator back into readable bytes.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("locator is empty")]
    EmptyLocator,
    #[error("file not found: {locator}")]
    NotFound { locator: String },
    #[error("access denied: {locator}")]
    AccessDenied { locator: String },
    #[error("failed to read {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: io::Error,
    },
}

pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;

impl ResolutionError {
    fn from_io(locator: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                locator: locator.to_string(),
            },
            io::ErrorKind::PermissionDenied => Self::AccessDenied {
                locator: locator.to_string(),
            },
            _ => Self::Io {
                locator: locator.to_string(),
                source: err,
            },
        }
    }
}

/// Opens a locator for reading.
pub trait ResourceOpener {
    fn open(&self, locator: &str) -> impl Future<Output = ResolutionResult<Vec<u8>>>;
}

/// Treats locators as filesystem paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResourceOpener;

impl ResourceOpener for FsResourceOpener {
    async fn open(&self, locator: &str) -> ResolutionResult<Vec<u8>> {
        if locator.is_empty() {
            return Err(ResolutionError::EmptyLocator);
        }
        let metadata = tokio::fs::metadata(locator)
            .await
            .map_err(|err| ResolutionError::from_io(locator, err))?;
        if metadata.is_dir() {
            return Err(ResolutionError::NotFound {
                locator: locator.to_string(),
            });
        }
        tokio::fs::read(locator)
            .await
            .map_err(|err| ResolutionError::from_io(locator, err))
    }
}

/// Directories the media collaborators read from and write into.
#[derive(Debug, Clone)]
pub struct StorageService {
    pictures_dir: PathBuf,
    captures_dir: PathBuf,
}

impl StorageService {
    pub const fn with_paths(pictures_dir: PathBuf, captures_dir: PathBuf) -> Self {
        Self {
            pictures_dir,
            captures_dir,
        }
    }

    /// `~/Pictures` for picking and `~/Pictures/keepsake` (or `captures_dir`)
    /// for new captures.
    pub fn with_default_paths(captures_dir: Option<PathBuf>) -> StorageResult<Self> {
        let home = std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;

        let mut pictures_dir = PathBuf::from(home);
        pictures_dir.push(PICTURES_SUBDIR);
        let captures_dir = captures_dir.unwrap_or_else(|| pictures_dir.join(CAPTURES_SUBDIR));

        Ok(Self::with_paths(pictures_dir, captures_dir))
    }

    pub fn pictures_dir(&self) -> &Path {
        &self.pictures_dir
    }

    pub fn captures_dir(&self) -> &Path {
        &self.captures_dir
    }

    /// Absolute target for a new capture, creating the captures directory.
    pub fn allocate_capture_path(&self, capture_id: &str) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.captures_dir)?;
        let mut path = absolute(&self.captures_dir)?;
        path.push(format!("{CAPTURE_PREFIX}{capture_id}.{CAPTURE_EXTENSION}"));
        Ok(path)
    }

    pub fn discard_capture(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir().map(|dir| dir.join(path))
}
