// ─── Status ───
// One refresh of everything the front end shows: host version, runtime
// version and entry point, plus the action it should offer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::core::patcher::{EntryPointState, LoaderPatcher};
use crate::core::version::{RuntimeStatus, VersionProbe};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HostStatus {
    Missing,
    Installed { version: String },
    Failed { reason: String },
}

/// A probe result or the description of why it could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Probed<T> {
    Ok(T),
    Failed(String),
}

impl<T> Probed<T> {
    pub fn ok(&self) -> Option<&T> {
        match self {
            Probed::Ok(value) => Some(value),
            Probed::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeAction {
    Install,
    Update,
    /// Uninstalling while the entry point targets the loader would leave the
    /// host unable to start, so it is offered but blocked.
    Uninstall { blocked_by_patch: bool },
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub checked_at: DateTime<Utc>,
    pub host: HostStatus,
    pub runtime: Probed<RuntimeStatus>,
    pub entry_point: Probed<EntryPointState>,
}

impl StatusReport {
    pub async fn collect(probe: &VersionProbe, patcher: &LoaderPatcher) -> Self {
        let host = match probe.read_host_version().await {
            Ok(Some(version)) => HostStatus::Installed { version },
            Ok(None) => HostStatus::Missing,
            Err(error) => {
                warn!("Host version unavailable: {}", error);
                HostStatus::Failed {
                    reason: error.to_string(),
                }
            }
        };

        let entry_point = match patcher.inspect().await {
            Ok(state) => Probed::Ok(state),
            Err(error) => {
                warn!("Entry point unavailable: {}", error);
                Probed::Failed(error.to_string())
            }
        };

        let runtime = match probe.runtime_status().await {
            Ok(status) => Probed::Ok(status),
            Err(error) => {
                warn!("Runtime status unavailable: {}", error);
                Probed::Failed(error.to_string())
            }
        };

        Self {
            checked_at: Utc::now(),
            host,
            runtime,
            entry_point,
        }
    }

    pub fn patched(&self) -> bool {
        self.entry_point.ok().is_some_and(EntryPointState::patched)
    }

    pub fn runtime_installed(&self) -> bool {
        self.runtime.ok().is_some_and(RuntimeStatus::installed)
    }

    pub fn runtime_action(&self) -> RuntimeAction {
        match &self.runtime {
            Probed::Ok(RuntimeStatus::Missing) => RuntimeAction::Install,
            Probed::Ok(RuntimeStatus::Outdated { .. }) => RuntimeAction::Update,
            Probed::Ok(RuntimeStatus::Latest { .. }) => RuntimeAction::Uninstall {
                blocked_by_patch: self.patched(),
            },
            Probed::Failed(_) => RuntimeAction::Unavailable,
        }
    }

    /// Backup-and-replace steps are shown once there is something to patch
    /// to, or something to revert.
    pub fn show_patch_steps(&self) -> bool {
        self.runtime_installed() || self.patched()
    }

    pub fn show_usage(&self) -> bool {
        self.patched()
    }
}
