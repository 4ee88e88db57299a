// ─── Manifests ───
// JSON documents read from disk or from the release metadata endpoint.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::core::error::{InstallerError, InstallerResult};

/// The host application's `package.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct HostManifest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
}

/// The installed runtime's `package.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeManifest {
    #[serde(default)]
    pub version: Option<String>,
}

/// Latest-release document served by the metadata endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub tag_name: Option<String>,
}

impl ReleaseInfo {
    /// `v4.2.10` -> `4.2.10`
    pub fn version(&self) -> InstallerResult<String> {
        let tag = self
            .tag_name
            .as_deref()
            .ok_or_else(|| InstallerError::Parse("release metadata has no tag_name".into()))?;
        Ok(tag.strip_prefix('v').unwrap_or(tag).to_string())
    }
}

/// Runtime WebUI descriptor under the NapCat data directory.
#[derive(Debug, Clone, Deserialize)]
pub struct WebUiConfig {
    pub port: Option<u16>,
    pub prefix: Option<String>,
    pub token: Option<String>,
}

impl WebUiConfig {
    pub fn link(&self) -> Option<String> {
        let port = self.port?;
        let prefix = self.prefix.as_deref()?;
        let token = self.token.as_deref()?;
        Some(format!("http://127.0.0.1:{port}{prefix}/webui?token={token}"))
    }
}

/// Read and parse a JSON file. A missing file is `Ok(None)`; a present but
/// malformed one is an error.
pub async fn read_json_file<T: DeserializeOwned>(path: &Path) -> InstallerResult<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!("No manifest at {:?}", path);
            return Ok(None);
        }
        Err(source) => return Err(InstallerError::io(path, source)),
    };

    Ok(Some(serde_json::from_slice(&bytes)?))
}
