// ─── Release Installer ───
// Downloads the runtime release archive and unpacks it into place.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::extract::extract_zip_file;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::paths::InstallLayout;
use crate::core::proxy::{MirrorTable, ProxyEndpoint};

pub const RELEASE_ASSET: &str =
    "https://github.com/NapNeko/NapCatQQ/releases/latest/download/NapCat.Shell.zip";

pub struct ReleaseInstaller {
    client: Client,
    layout: InstallLayout,
    mirrors: MirrorTable,
    asset: String,
}

impl ReleaseInstaller {
    pub fn new(client: Client, layout: InstallLayout, mirrors: MirrorTable) -> Self {
        Self {
            client,
            layout,
            mirrors,
            asset: RELEASE_ASSET.to_string(),
        }
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = asset.into();
        self
    }

    /// Replace any existing runtime with the latest release fetched through
    /// `endpoint`. Runs to completion or failure; there is no cancellation.
    #[instrument(skip(self))]
    pub async fn install(&self, endpoint: ProxyEndpoint) -> InstallerResult<PathBuf> {
        let runtime_dir = self.layout.runtime_dir();

        match tokio::fs::remove_dir_all(&runtime_dir).await {
            Ok(()) => info!("Removed previous runtime at {:?}", runtime_dir),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(InstallerError::io(&runtime_dir, source)),
        }

        tokio::fs::create_dir_all(&runtime_dir)
            .await
            .map_err(|source| InstallerError::io(&runtime_dir, source))?;

        let url = self.mirrors.url_for(endpoint, &self.asset);
        let zip_path = self
            .layout
            .staging_dir()
            .join(format!("{}.zip", Uuid::new_v4()));

        let download_start = Instant::now();
        info!("Downloading runtime release from {}", url);
        let result = match download_to_file(&self.client, &url, &zip_path).await {
            Ok(()) => {
                info!(
                    "Runtime download finished in {:?}",
                    download_start.elapsed()
                );
                self.unpack(&zip_path, &runtime_dir).await
            }
            Err(error) => Err(error),
        };
        if let Err(error) = tokio::fs::remove_file(&zip_path).await {
            debug!("Archive not removed ({:?}): {}", zip_path, error);
        }

        match result {
            Ok(files) => {
                info!("Installed {} files into {:?}", files, runtime_dir);
                Ok(runtime_dir)
            }
            Err(error) => {
                // A partial runtime must not read back as an install.
                if let Err(cleanup) = tokio::fs::remove_dir_all(&runtime_dir).await {
                    warn!("Could not clean up {:?}: {}", runtime_dir, cleanup);
                }
                Err(error)
            }
        }
    }

    async fn unpack(&self, zip_path: &Path, runtime_dir: &Path) -> InstallerResult<usize> {
        let extract_start = Instant::now();
        let archive = zip_path.to_path_buf();
        let target = runtime_dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || extract_zip_file(&archive, &target))
            .await
            .map_err(|e| InstallerError::Other(format!("Task join error: {e}")))??;
        debug!("Extracted {} files in {:?}", files, extract_start.elapsed());
        Ok(files)
    }

    /// Delete the loader script (best effort), then the runtime directory.
    #[instrument(skip(self))]
    pub async fn remove(&self) -> InstallerResult<()> {
        let loader = self.layout.loader_script();
        if let Err(error) = tokio::fs::remove_file(&loader).await {
            debug!("Loader script not removed ({:?}): {}", loader, error);
        }

        let runtime_dir = self.layout.runtime_dir();
        tokio::fs::remove_dir_all(&runtime_dir)
            .await
            .map_err(|source| InstallerError::io(&runtime_dir, source))?;

        info!("Removed runtime at {:?}", runtime_dir);
        Ok(())
    }
}

async fn download_to_file(client: &Client, url: &str, dest: &Path) -> InstallerResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| InstallerError::io(parent, source))?;
    }

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(InstallerError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|source| InstallerError::io(dest, source))?;

    let mut downloaded = 0_u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|source| InstallerError::io(dest, source))?;
        downloaded = downloaded.saturating_add(chunk.len() as u64);
    }
    file.flush()
        .await
        .map_err(|source| InstallerError::io(dest, source))?;

    debug!("Downloaded {} bytes: {} -> {:?}", downloaded, url, dest);
    Ok(())
}
