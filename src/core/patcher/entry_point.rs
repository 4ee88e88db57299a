use serde::Serialize;

use super::script::LoaderDispatch;
use crate::core::paths::InstallLayout;

/// What the host manifest's `main` field currently points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "entry", rename_all = "snake_case")]
pub enum EntryPointState {
    /// One of the host's own launchers.
    Original(String),
    /// The generated NapCat loader.
    Patched,
    Custom(String),
    /// Host manifest not found.
    Unreadable,
}

impl EntryPointState {
    pub fn patched(&self) -> bool {
        matches!(self, EntryPointState::Patched)
    }
}

/// Entry point values recognised by classification.
#[derive(Debug, Clone)]
pub struct KnownEntryPoints {
    originals: Vec<String>,
    loader: String,
}

impl KnownEntryPoints {
    pub fn new(originals: Vec<String>, loader: impl Into<String>) -> Self {
        Self {
            originals,
            loader: loader.into(),
        }
    }

    pub fn from_dispatch(dispatch: &LoaderDispatch, layout: &InstallLayout) -> Self {
        Self::new(dispatch.known_entries(), layout.loader_entry_reference())
    }

    pub fn loader(&self) -> &str {
        &self.loader
    }

    pub fn originals(&self) -> &[String] {
        &self.originals
    }

    pub fn classify(&self, entry: &str) -> EntryPointState {
        if entry == self.loader {
            EntryPointState::Patched
        } else if self.originals.iter().any(|original| original == entry) {
            EntryPointState::Original(entry.to_string())
        } else {
            EntryPointState::Custom(entry.to_string())
        }
    }
}
