use std::path::PathBuf;

use reqwest::Client;

use super::settings::{
    default_settings_dir, load_settings_from_disk, save_settings_to_disk, InstallerSettings,
};
use crate::core::error::InstallerResult;
use crate::core::http::build_http_client;
use crate::core::installer::ReleaseInstaller;
use crate::core::paths::InstallLayout;
use crate::core::patcher::LoaderPatcher;
use crate::core::proxy::{MirrorTable, ProxyResolver};
use crate::core::version::VersionProbe;

/// Everything a command needs. Components are built per call so each refresh
/// sees fresh on-disk state; nothing derived is cached here.
pub struct AppState {
    pub layout: InstallLayout,
    pub http_client: Client,
    pub mirrors: MirrorTable,
    pub settings_dir: PathBuf,
    pub settings: InstallerSettings,
}

impl AppState {
    pub fn new() -> InstallerResult<Self> {
        let settings_dir = default_settings_dir();
        Self::with_layout(InstallLayout::detect()?, settings_dir)
    }

    pub fn with_layout(layout: InstallLayout, settings_dir: PathBuf) -> InstallerResult<Self> {
        let http_client = build_http_client()?;
        let settings = load_settings_from_disk(&settings_dir);

        Ok(Self {
            layout,
            http_client,
            mirrors: MirrorTable::default(),
            settings_dir,
            settings,
        })
    }

    pub fn version_probe(&self) -> VersionProbe {
        VersionProbe::new(self.http_client.clone(), self.layout.clone())
    }

    pub fn proxy_resolver(&self) -> ProxyResolver {
        ProxyResolver::new(self.http_client.clone(), self.mirrors.clone())
    }

    pub fn release_installer(&self) -> ReleaseInstaller {
        ReleaseInstaller::new(
            self.http_client.clone(),
            self.layout.clone(),
            self.mirrors.clone(),
        )
    }

    pub fn loader_patcher(&self) -> LoaderPatcher {
        LoaderPatcher::new(self.layout.clone(), self.settings.loader_dispatch.clone())
    }

    pub fn save_settings(&self) -> std::io::Result<()> {
        save_settings_to_disk(&self.settings_dir, &self.settings)
    }
}
