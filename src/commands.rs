use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::info;

use crate::core::error::{InstallerError, InstallerResult};
use crate::core::patcher::{PatchOutcome, RevertGuidance, LAUNCH_FLAG};
use crate::core::proxy::{ProxyChoice, ProxyEndpoint};
use crate::core::state::{AppState, InstallerSettings};
use crate::core::status::{RuntimeAction, StatusReport};
use crate::core::version::manifest::{read_json_file, WebUiConfig};

#[derive(Debug, Serialize)]
pub struct StatusPayload {
    #[serde(flatten)]
    pub report: StatusReport,
    pub runtime_action: RuntimeAction,
    pub show_patch_steps: bool,
    pub show_usage: bool,
}

#[derive(Debug, Serialize)]
pub struct InstallSummary {
    pub endpoint: ProxyEndpoint,
    pub runtime_dir: PathBuf,
    pub version: Option<String>,
}

pub async fn get_status(state: &AppState) -> StatusPayload {
    let probe = state.version_probe();
    let patcher = state.loader_patcher();
    let report = StatusReport::collect(&probe, &patcher).await;

    StatusPayload {
        runtime_action: report.runtime_action(),
        show_patch_steps: report.show_patch_steps(),
        show_usage: report.show_usage(),
        report,
    }
}

/// Resolve the mirror once, then install through it. `None` uses the saved
/// preference.
pub async fn install_runtime(
    state: &AppState,
    choice: Option<ProxyChoice>,
) -> InstallerResult<InstallSummary> {
    let choice = choice.unwrap_or(state.settings.proxy);
    let endpoint = state.proxy_resolver().resolve(choice).await?;
    info!("Installing runtime via {} ({})", endpoint, choice);

    let runtime_dir = state.release_installer().install(endpoint).await?;
    let version = state.version_probe().read_local_runtime_version().await?;

    Ok(InstallSummary {
        endpoint,
        runtime_dir,
        version,
    })
}

pub async fn remove_runtime(state: &AppState) -> InstallerResult<()> {
    let entry_point = state.loader_patcher().inspect().await?;
    if entry_point.patched() {
        return Err(InstallerError::Other(
            "QQ still starts through the NapCat loader; restore the original package.json before uninstalling".into(),
        ));
    }
    state.release_installer().remove().await
}

pub async fn stage_patched_manifest(state: &AppState) -> InstallerResult<PatchOutcome> {
    state.loader_patcher().patch().await
}

pub async fn revert_entry_point(state: &AppState) -> InstallerResult<RevertGuidance> {
    state.loader_patcher().revert().await
}

pub async fn probe_mirrors(state: &AppState) -> InstallerResult<ProxyEndpoint> {
    state.proxy_resolver().resolve_automatic().await
}

pub async fn get_webui_link(state: &AppState) -> InstallerResult<Option<String>> {
    let config: Option<WebUiConfig> = read_json_file(&state.layout.webui_config()).await?;
    Ok(config.and_then(|c| c.link()))
}

pub fn reveal_host_manifest(state: &AppState) -> InstallerResult<PathBuf> {
    let path = state.layout.host_manifest();
    reveal_in_file_manager(&path)?;
    Ok(path)
}

pub fn reveal_staged_manifest(state: &AppState) -> InstallerResult<PathBuf> {
    let path = state.layout.staged_manifest();
    if !path.exists() {
        return Err(InstallerError::Other(
            "No patched package.json has been staged yet; run `patch` first".into(),
        ));
    }
    reveal_in_file_manager(&path)?;
    Ok(path)
}

pub fn usage_instructions() -> String {
    format!(
        "# Start from a terminal with NapCat injected\n\
         $ /Applications/QQ.app/Contents/MacOS/QQ {LAUNCH_FLAG}\n\
         # Add -q <QQ number> to log in quickly\n\
         \n\
         # Start the normal QQ GUI without NapCat\n\
         $ open -a QQ.app -n\n"
    )
}

pub fn get_settings(state: &AppState) -> InstallerSettings {
    state.settings.clone()
}

pub fn set_proxy_preference(
    state: &mut AppState,
    choice: ProxyChoice,
) -> InstallerResult<InstallerSettings> {
    state.settings.proxy = choice;
    state.save_settings().map_err(|source| InstallerError::Io {
        path: state.settings_dir.clone(),
        source,
    })?;
    Ok(state.settings.clone())
}

/// Select `path` in the platform file manager.
fn reveal_in_file_manager(path: &Path) -> InstallerResult<()> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut cmd = Command::new("explorer");
        cmd.arg(format!("/select,{}", path.display()));
        cmd
    };

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut cmd = Command::new("open");
        cmd.arg("-R").arg(path);
        cmd
    };

    #[cfg(all(unix, not(target_os = "macos")))]
    let mut command = {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path.parent().unwrap_or(path));
        cmd
    };

    let status = command.status().map_err(|source| InstallerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if !status.success() {
        return Err(InstallerError::Other(format!(
            "Could not open the file manager for {:?}",
            path
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::InstallLayout;

    fn state_in(root: &Path) -> AppState {
        let layout = InstallLayout::new(
            root.join("app"),
            root.join("container"),
            root.join("staging"),
        );
        AppState::with_layout(layout, root.join("settings")).unwrap()
    }

    #[tokio::test]
    async fn webui_link_is_built_from_runtime_config() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        assert_eq!(get_webui_link(&state).await.unwrap(), None);

        let config = state.layout.webui_config();
        std::fs::create_dir_all(config.parent().unwrap()).unwrap();
        std::fs::write(&config, r#"{"port":6099,"prefix":"/napcat","token":"s3cret"}"#).unwrap();

        assert_eq!(
            get_webui_link(&state).await.unwrap().as_deref(),
            Some("http://127.0.0.1:6099/napcat/webui?token=s3cret")
        );
    }

    #[tokio::test]
    async fn remove_is_refused_while_patched() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        std::fs::create_dir_all(state.layout.host_app_dir()).unwrap();
        std::fs::write(
            state.layout.host_manifest(),
            format!(
                r#"{{"version":"6.9.63","main":"{}"}}"#,
                state.layout.loader_entry_reference()
            ),
        )
        .unwrap();
        std::fs::create_dir_all(state.layout.runtime_dir()).unwrap();

        let err = remove_runtime(&state).await.unwrap_err();
        assert!(err.to_string().contains("restore the original package.json"));
        assert!(state.layout.runtime_dir().exists());
    }

    #[test]
    fn explicit_proxy_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());

        let saved =
            set_proxy_preference(&mut state, ProxyChoice::Explicit(ProxyEndpoint::Moeyy)).unwrap();
        assert_eq!(saved.proxy, ProxyChoice::Explicit(ProxyEndpoint::Moeyy));

        let reloaded = state_in(dir.path());
        assert_eq!(
            get_settings(&reloaded).proxy,
            ProxyChoice::Explicit(ProxyEndpoint::Moeyy)
        );
    }

    #[tokio::test]
    async fn status_of_empty_machine() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let status = get_status(&state).await;
        assert_eq!(status.report.host, crate::core::status::HostStatus::Missing);
        assert_eq!(status.runtime_action, RuntimeAction::Install);
        assert!(!status.show_patch_steps);
    }

    #[test]
    fn usage_mentions_launch_flag() {
        assert!(usage_instructions().contains("QQ --no-sandbox"));
    }
}
