pub mod manifest;
pub mod probe;

pub use manifest::{HostManifest, ReleaseInfo, RuntimeManifest, WebUiConfig};
pub use probe::{classify_runtime, compare_versions, RuntimeStatus, VersionProbe};
