use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "keepsake";
const APP_CONFIG_FILE: &str = "config.json";
const ROAMING_DIR: &str = "roaming";
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_CAMERA_COMMAND: &str = "fswebcam";
const DEFAULT_CAPTURE_FRAME_HEIGHT: u32 = 720;

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Overrides the roaming settings file location.
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
    /// Directory camera captures are written to. Defaults to `~/Pictures/keepsake`.
    #[serde(default)]
    pub captures_dir: Option<PathBuf>,
    #[serde(default = "default_camera_command")]
    pub camera_command: String,
    /// Arguments for the camera command. `{resolution}` and `{output}` are
    /// substituted; the output path is appended when `{output}` is absent.
    #[serde(default = "default_camera_args")]
    pub camera_args: Vec<String>,
    #[serde(default = "default_capture_frame_height")]
    pub capture_frame_height: u32,
    #[serde(default = "default_notifications")]
    pub notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: None,
            captures_dir: None,
            camera_command: default_camera_command(),
            camera_args: default_camera_args(),
            capture_frame_height: default_capture_frame_height(),
            notifications: default_notifications(),
        }
    }
}

fn default_camera_command() -> String {
    DEFAULT_CAMERA_COMMAND.to_string()
}

fn default_camera_args() -> Vec<String> {
    ["--no-banner", "-r", "{resolution}", "{output}"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_capture_frame_height() -> u32 {
    DEFAULT_CAPTURE_FRAME_HEIGHT
}

fn default_notifications() -> bool {
    true
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn data_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn app_config_path(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = xdg_root(xdg_config_home, home, ".config")?;
    path.push(APP_DIR);
    path.push(APP_CONFIG_FILE);
    Ok(path)
}

/// Location of the roaming settings namespace.
pub(crate) fn roaming_settings_path(
    xdg_data_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = xdg_root(xdg_data_home, home, ".local/share")?;
    path.push(APP_DIR);
    path.push(ROAMING_DIR);
    path.push(SETTINGS_FILE);
    Ok(path)
}

fn xdg_root(
    xdg_home: Option<&Path>,
    home: Option<&Path>,
    home_relative: &str,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(home_relative))
}
