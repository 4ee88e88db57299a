use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the installer backend.
/// Every module returns `Result<T, InstallerError>`.
#[derive(Debug, Error)]
pub enum InstallerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("All {attempted} mirrors are unreachable, last error: {last}")]
    AllMirrorsUnreachable {
        attempted: usize,
        last: Box<InstallerError>,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected data: {0}")]
    Parse(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type InstallerResult<T> = Result<T, InstallerError>;

impl InstallerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallerError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for InstallerError {
    fn from(source: std::io::Error) -> Self {
        InstallerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for command payloads ─────────────────
// `--json` output carries errors as their display string.
impl serde::Serialize for InstallerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_unreachable_mentions_last_error() {
        let err = InstallerError::AllMirrorsUnreachable {
            attempted: 5,
            last: Box::new(InstallerError::DownloadFailed {
                url: "https://x.haod.me/probe".into(),
                status: 502,
            }),
        };
        let text = err.to_string();
        assert!(text.contains("All 5 mirrors"));
        assert!(text.contains("HTTP 502"));
    }

    #[test]
    fn serializes_as_display_string() {
        let err = InstallerError::Parse("missing tag_name".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Unexpected data: missing tag_name\"");
    }
}
