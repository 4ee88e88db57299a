// ─── Install Layout ───
// Fixed on-disk layout of the host application and the NapCat runtime.

use std::path::{Component, Path, PathBuf};

use crate::core::error::{InstallerError, InstallerResult};

pub const HOST_APP_DIR: &str = "/Applications/QQ.app/Contents/Resources/app";
const CONTAINER_DIR: &str = "Library/Containers/com.tencent.qq/Data";
const DATA_DIR: &str = "Library/Application Support/QQ/NapCat";
const APP_DIR_NAME: &str = "NapCatInstaller";

const MANIFEST_FILE: &str = "package.json";
const RUNTIME_DIR_NAME: &str = "napcat";
const RUNTIME_ENTRY_MODULE: &str = "napcat.mjs";
const LOADER_FILE: &str = "loadNapCat.js";

#[derive(Debug, Clone)]
pub struct InstallLayout {
    host_app_dir: PathBuf,
    container_dir: PathBuf,
    staging_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(
        host_app_dir: impl Into<PathBuf>,
        container_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host_app_dir: host_app_dir.into(),
            container_dir: container_dir.into(),
            staging_dir: staging_dir.into(),
        }
    }

    /// Layout of the current user: the host's sandbox container lives under
    /// the home directory, staging goes to the system temp dir.
    pub fn detect() -> InstallerResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| InstallerError::Other("Cannot determine home directory".into()))?;

        Ok(Self::new(
            HOST_APP_DIR,
            home.join(CONTAINER_DIR),
            std::env::temp_dir().join(APP_DIR_NAME),
        ))
    }

    pub fn host_app_dir(&self) -> &Path {
        &self.host_app_dir
    }

    pub fn host_manifest(&self) -> PathBuf {
        self.host_app_dir.join(MANIFEST_FILE)
    }

    /// The host's own launcher, used by the loader when not injecting.
    pub fn host_launcher(&self) -> PathBuf {
        self.host_app_dir.join("app_launcher").join("index.js")
    }

    pub fn container_dir(&self) -> &Path {
        &self.container_dir
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.container_dir.join("Documents")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.container_dir.join(DATA_DIR)
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.documents_dir().join(RUNTIME_DIR_NAME)
    }

    pub fn runtime_manifest(&self) -> PathBuf {
        self.runtime_dir().join(MANIFEST_FILE)
    }

    pub fn runtime_entry_module(&self) -> PathBuf {
        self.runtime_dir().join(RUNTIME_ENTRY_MODULE)
    }

    pub fn loader_script(&self) -> PathBuf {
        self.documents_dir().join(LOADER_FILE)
    }

    pub fn webui_config(&self) -> PathBuf {
        self.data_dir().join("config").join("webui.json")
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn staged_manifest(&self) -> PathBuf {
        self.staging_dir.join(MANIFEST_FILE)
    }

    /// Value written into the host manifest's `main` field.
    ///
    /// The host resolves `main` relative to its app directory, so the loader's
    /// absolute path is prefixed with one `..` per component of that directory
    /// (five for the stock install location).
    pub fn loader_entry_reference(&self) -> String {
        let depth = self
            .host_app_dir
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count();
        let traversal = vec![".."; depth].join("/");
        format!("{}{}", traversal, self.loader_script().to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_layout() -> InstallLayout {
        InstallLayout::new(
            HOST_APP_DIR,
            "/Users/alice/Library/Containers/com.tencent.qq/Data",
            "/tmp/NapCatInstaller",
        )
    }

    #[test]
    fn derived_paths_follow_container_layout() {
        let layout = stock_layout();
        assert_eq!(
            layout.runtime_manifest(),
            PathBuf::from(
                "/Users/alice/Library/Containers/com.tencent.qq/Data/Documents/napcat/package.json"
            )
        );
        assert_eq!(
            layout.webui_config(),
            PathBuf::from("/Users/alice/Library/Containers/com.tencent.qq/Data/Library/Application Support/QQ/NapCat/config/webui.json")
        );
        assert_eq!(
            layout.host_manifest(),
            PathBuf::from("/Applications/QQ.app/Contents/Resources/app/package.json")
        );
    }

    #[test]
    fn loader_reference_climbs_out_of_host_app_dir() {
        let layout = stock_layout();
        assert_eq!(
            layout.loader_entry_reference(),
            "../../../../../Users/alice/Library/Containers/com.tencent.qq/Data/Documents/loadNapCat.js"
        );
    }
}
