pub mod entry_point;
#[allow(clippy::module_inception)]
pub mod patcher;
pub mod script;

pub use entry_point::{EntryPointState, KnownEntryPoints};
pub use patcher::{LoaderPatcher, PatchOutcome, RevertGuidance, StagedManifest};
pub use script::{render_loader_script, DispatchRule, LoaderDispatch, LAUNCH_FLAG};
