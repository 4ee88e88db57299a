mod commands;
pub mod core;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::core::error::InstallerResult;
use crate::core::patcher::{EntryPointState, PatchOutcome, RevertGuidance};
use crate::core::proxy::ProxyChoice;
use crate::core::state::AppState;
use crate::core::status::{HostStatus, Probed, RuntimeAction};
use crate::core::version::RuntimeStatus;

#[derive(Debug, Parser)]
#[command(name = "napcat-installer", version, about = "Install NapCat into QQ for macOS")]
struct Cli {
    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Show QQ version, NapCat version and QQ's entry point.
    Status,
    /// Download and install the latest NapCat release.
    Install {
        /// auto, direct, moeyy, ghproxy, gh-proxy or haod. Defaults to the saved preference.
        #[arg(long)]
        proxy: Option<ProxyChoice>,
    },
    /// Uninstall NapCat and its loader script.
    Remove,
    /// Write the loader script and stage a patched package.json.
    Patch,
    /// Explain how to restore the original entry point.
    Revert,
    /// Reveal QQ's package.json (to back it up or restore it).
    RevealHost,
    /// Reveal the staged package.json (to copy it over QQ's).
    RevealStaged,
    /// Print the NapCat WebUI link.
    Webui,
    /// Print how to start QQ with or without NapCat.
    Usage,
    /// Race every mirror and report the first to answer.
    ProbeMirrors,
    /// Show or change saved settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    SetProxy { choice: ProxyChoice },
}

pub async fn run() -> ExitCode {
    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,napcat_installer_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("NapCatInstaller {} starting", env!("CARGO_PKG_VERSION"));

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{}", error);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> InstallerResult<()> {
    let json = cli.json;
    let mut state = AppState::new()?;

    match cli.command {
        CliCommand::Status => {
            let status = commands::get_status(&state).await;
            emit(json, &status, |s| {
                let mut out = format!(
                    "QQ:          {}\nNapCat:      {}\nEntry point: {}\n",
                    describe_host(&s.report.host),
                    describe_runtime(&s.report.runtime),
                    describe_entry_point(&s.report.entry_point),
                );
                out.push_str(&format!("Action:      {}\n", describe_action(s.runtime_action)));
                if s.show_patch_steps && !s.show_usage {
                    out.push_str(
                        "\nBack up QQ's package.json (reveal-host), then run `patch` and copy the staged file over it (reveal-staged).\n",
                    );
                }
                if s.show_usage {
                    out.push('\n');
                    out.push_str(&commands::usage_instructions());
                }
                out
            });
        }
        CliCommand::Install { proxy } => {
            let summary = commands::install_runtime(&state, proxy).await?;
            emit(json, &summary, |s| {
                format!(
                    "Installed NapCat {} via {} into {}\n",
                    s.version.as_deref().unwrap_or("(unknown version)"),
                    s.endpoint,
                    s.runtime_dir.display()
                )
            });
        }
        CliCommand::Remove => {
            commands::remove_runtime(&state).await?;
            emit(json, &"removed", |_| "NapCat removed\n".to_string());
        }
        CliCommand::Patch => {
            let outcome = commands::stage_patched_manifest(&state).await?;
            emit(json, &outcome, |o| match o {
                PatchOutcome::Staged(staged) => format!(
                    "Loader written to {}\nPatched package.json staged at {}\nBack up {} and replace it with the staged file, then check `status`.\n",
                    staged.loader_script.display(),
                    staged.staged_manifest.display(),
                    staged.host_manifest.display()
                ),
                PatchOutcome::HostManifestUnavailable { host_manifest } => format!(
                    "QQ's package.json is not readable at {}; nothing was changed\n",
                    host_manifest.display()
                ),
            });
        }
        CliCommand::Revert => {
            let guidance = commands::revert_entry_point(&state).await?;
            emit(json, &guidance, |g| match g {
                RevertGuidance::RestoreBackup { host_manifest } => format!(
                    "Put your backed-up package.json back at {} and check `status`.\n",
                    host_manifest.display()
                ),
                RevertGuidance::NothingToRevert { state } => format!(
                    "Entry point is {}; nothing to revert\n",
                    describe_entry_point(&Probed::Ok(state.clone()))
                ),
            });
        }
        CliCommand::RevealHost => {
            let path = commands::reveal_host_manifest(&state)?;
            emit(json, &path, |p| format!("{}\n", p.display()));
        }
        CliCommand::RevealStaged => {
            let path = commands::reveal_staged_manifest(&state)?;
            emit(json, &path, |p| format!("{}\n", p.display()));
        }
        CliCommand::Webui => {
            let link = commands::get_webui_link(&state).await?;
            emit(json, &link, |l| match l {
                Some(link) => format!("{link}\n"),
                None => "WebUI is not configured yet; start NapCat once first\n".to_string(),
            });
        }
        CliCommand::Usage => {
            let text = commands::usage_instructions();
            emit(json, &text, |t| t.clone());
        }
        CliCommand::ProbeMirrors => {
            let endpoint = commands::probe_mirrors(&state).await?;
            emit(json, &endpoint, |e| format!("Fastest reachable mirror: {e}\n"));
        }
        CliCommand::Config { action } => {
            let settings = match action {
                ConfigAction::Show => commands::get_settings(&state),
                ConfigAction::SetProxy { choice } => {
                    commands::set_proxy_preference(&mut state, choice)?
                }
            };
            emit(json, &settings, |s| {
                let rules: Vec<String> = s
                    .loader_dispatch
                    .rules
                    .iter()
                    .map(|r| format!("  >= {} -> {}", r.min_build, r.entry))
                    .collect();
                format!(
                    "proxy: {}\nloader dispatch ({}):\n{}\n  else -> {}\n",
                    s.proxy,
                    s.loader_dispatch.revision,
                    rules.join("\n"),
                    s.loader_dispatch.fallback
                )
            });
        }
    }

    Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T) -> String) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(error) => eprintln!("error: {error}"),
        }
    } else {
        print!("{}", human(value));
    }
}

fn describe_host(host: &HostStatus) -> String {
    match host {
        HostStatus::Missing => "not installed".into(),
        HostStatus::Installed { version } => version.clone(),
        HostStatus::Failed { reason } => format!("error ({reason})"),
    }
}

fn describe_runtime(runtime: &Probed<RuntimeStatus>) -> String {
    match runtime {
        Probed::Ok(RuntimeStatus::Missing) => "not installed".into(),
        Probed::Ok(RuntimeStatus::Outdated { local, remote }) => {
            format!("{local}, {remote} available")
        }
        Probed::Ok(RuntimeStatus::Latest { version }) => format!("{version}, up to date"),
        Probed::Failed(reason) => format!("error ({reason})"),
    }
}

fn describe_entry_point(entry_point: &Probed<EntryPointState>) -> String {
    match entry_point {
        Probed::Ok(EntryPointState::Original(entry)) => format!("original QQ ({entry})"),
        Probed::Ok(EntryPointState::Patched) => "NapCat loader".into(),
        Probed::Ok(EntryPointState::Custom(entry)) => format!("custom ({entry})"),
        Probed::Ok(EntryPointState::Unreadable) => "package.json not found".into(),
        Probed::Failed(reason) => format!("error ({reason})"),
    }
}

fn describe_action(action: RuntimeAction) -> &'static str {
    match action {
        RuntimeAction::Install => "install",
        RuntimeAction::Update => "update",
        RuntimeAction::Uninstall {
            blocked_by_patch: false,
        } => "remove",
        RuntimeAction::Uninstall {
            blocked_by_patch: true,
        } => "remove (revert the entry point first)",
        RuntimeAction::Unavailable => "none",
    }
}
