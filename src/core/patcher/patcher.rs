// ─── Loader Patcher ───
// Writes the loader script and stages a host manifest whose entry point
// targets it. The host app directory is write-protected, so the staged copy
// is handed to the user to put in place; nothing here writes into it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::entry_point::{EntryPointState, KnownEntryPoints};
use super::script::{render_loader_script, LoaderDispatch};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::paths::InstallLayout;
use crate::core::version::manifest::read_json_file;

#[derive(Debug, Clone, Serialize)]
pub struct StagedManifest {
    pub loader_script: PathBuf,
    /// Rewritten manifest, to be copied over `host_manifest` by the user.
    pub staged_manifest: PathBuf,
    pub host_manifest: PathBuf,
    pub main: String,
    pub previous: EntryPointState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PatchOutcome {
    Staged(StagedManifest),
    HostManifestUnavailable { host_manifest: PathBuf },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RevertGuidance {
    /// Put the backed-up original manifest back over `host_manifest`.
    RestoreBackup { host_manifest: PathBuf },
    NothingToRevert { state: EntryPointState },
}

pub struct LoaderPatcher {
    layout: InstallLayout,
    dispatch: LoaderDispatch,
    known: KnownEntryPoints,
}

impl LoaderPatcher {
    pub fn new(layout: InstallLayout, dispatch: LoaderDispatch) -> Self {
        let known = KnownEntryPoints::from_dispatch(&dispatch, &layout);
        Self {
            layout,
            dispatch,
            known,
        }
    }

    pub fn known_entry_points(&self) -> &KnownEntryPoints {
        &self.known
    }

    pub fn render_script(&self) -> String {
        render_loader_script(&self.layout, &self.dispatch)
    }

    pub async fn inspect(&self) -> InstallerResult<EntryPointState> {
        Ok(match self.read_host_manifest().await? {
            None => EntryPointState::Unreadable,
            Some(manifest) => self.classify_manifest(&manifest)?,
        })
    }

    /// Host manifest as an ordered JSON object; `None` when the file is absent.
    async fn read_host_manifest(&self) -> InstallerResult<Option<Map<String, Value>>> {
        let host_manifest = self.layout.host_manifest();
        match read_json_file::<Value>(&host_manifest).await? {
            None => Ok(None),
            Some(Value::Object(manifest)) => Ok(Some(manifest)),
            Some(_) => Err(InstallerError::Parse(format!(
                "{} is not a JSON object",
                host_manifest.display()
            ))),
        }
    }

    /// A missing `main` counts as an empty entry; any non-string is rejected.
    fn classify_manifest(
        &self,
        manifest: &Map<String, Value>,
    ) -> InstallerResult<EntryPointState> {
        match manifest.get("main") {
            None | Some(Value::Null) => Ok(self.known.classify("")),
            Some(Value::String(entry)) => Ok(self.known.classify(entry)),
            Some(other) => Err(InstallerError::Parse(format!(
                "{} has a non-string \"main\": {}",
                self.layout.host_manifest().display(),
                other
            ))),
        }
    }

    /// Write the loader script and stage the rewritten host manifest.
    /// Repeating the call with unchanged inputs produces identical files.
    #[instrument(skip(self))]
    pub async fn patch(&self) -> InstallerResult<PatchOutcome> {
        let host_manifest = self.layout.host_manifest();
        let Some(mut manifest) = self.read_host_manifest().await? else {
            warn!("Host manifest {:?} not found, nothing to patch", host_manifest);
            return Ok(PatchOutcome::HostManifestUnavailable { host_manifest });
        };
        let previous = self.classify_manifest(&manifest)?;

        if !self.layout.runtime_entry_module().exists() {
            warn!(
                "Runtime entry {:?} is missing; the loader will fail until it is installed",
                self.layout.runtime_entry_module()
            );
        }

        let loader_script = self.layout.loader_script();
        write_atomically(&loader_script, self.render_script().as_bytes()).await?;

        let main = self.known.loader().to_string();
        manifest.insert("main".into(), Value::String(main.clone()));
        let mut staged = serde_json::to_string_pretty(&Value::Object(manifest))?;
        staged.push('\n');

        let staged_manifest = self.layout.staged_manifest();
        write_atomically(&staged_manifest, staged.as_bytes()).await?;

        info!(
            "Staged patched manifest at {:?} (was {:?})",
            staged_manifest, previous
        );
        Ok(PatchOutcome::Staged(StagedManifest {
            loader_script,
            staged_manifest,
            host_manifest,
            main,
            previous,
        }))
    }

    /// Restoring the original manifest is left to the user; this only says
    /// whether there is anything to restore.
    pub async fn revert(&self) -> InstallerResult<RevertGuidance> {
        let state = self.inspect().await?;
        Ok(match state {
            EntryPointState::Patched => RevertGuidance::RestoreBackup {
                host_manifest: self.layout.host_manifest(),
            },
            state => RevertGuidance::NothingToRevert { state },
        })
    }
}

/// Write through a sibling temp file and rename over `path`.
async fn write_atomically(path: &Path, contents: &[u8]) -> InstallerResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| InstallerError::Other(format!("{} has no parent", path.display())))?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| InstallerError::io(parent, source))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    tokio::fs::write(&temp, contents)
        .await
        .map_err(|source| InstallerError::io(&temp, source))?;
    if let Err(source) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(InstallerError::io(path, source));
    }
    Ok(())
}
