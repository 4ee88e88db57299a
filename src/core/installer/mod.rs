pub mod extract;
pub mod release;

pub use extract::extract_zip_file;
pub use release::{ReleaseInstaller, RELEASE_ASSET};
