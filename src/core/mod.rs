// ─── NapCatInstaller Core ───
// Installs the NapCat runtime into QQ's sandbox container and redirects QQ's
// entry point to a generated loader.
//
// Architecture:
//   core/
//     paths       — Fixed install layout (host app, container, staging)
//     version/    — Host/runtime manifests + latest release tag
//     proxy/      — GitHub mirrors + first-success mirror racing
//     installer/  — Release download, zip extraction, removal
//     patcher/    — Entry point classification, loader script, staged manifest
//     status      — One refresh of everything the front end shows
//     state/      — Application state + persisted settings

pub mod error;
pub mod http;
pub mod installer;
pub mod patcher;
pub mod paths;
pub mod proxy;
pub mod state;
pub mod status;
pub mod version;
