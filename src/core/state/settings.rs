use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::patcher::LoaderDispatch;
use crate::core::proxy::ProxyChoice;

const APP_DIR_NAME: &str = "NapCatInstaller";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerSettings {
    #[serde(default)]
    pub proxy: ProxyChoice,
    #[serde(default)]
    pub loader_dispatch: LoaderDispatch,
}

pub fn default_settings_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn settings_path(settings_dir: &Path) -> PathBuf {
    settings_dir.join(SETTINGS_FILE)
}

/// Missing or unreadable settings fall back to the defaults.
pub fn load_settings_from_disk(settings_dir: &Path) -> InstallerSettings {
    let path = settings_path(settings_dir);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return InstallerSettings::default(),
    };
    match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(error) => {
            warn!("Ignoring unreadable settings at {:?}: {}", path, error);
            InstallerSettings::default()
        }
    }
}

pub fn save_settings_to_disk(
    settings_dir: &Path,
    settings: &InstallerSettings,
) -> std::io::Result<()> {
    std::fs::create_dir_all(settings_dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(settings_path(settings_dir), json)
}
