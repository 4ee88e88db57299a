// ─── Version Probe ───
// Installed host version, installed runtime version, latest runtime release.

use std::cmp::Ordering;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::manifest::{read_json_file, HostManifest, ReleaseInfo, RuntimeManifest};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::paths::InstallLayout;

pub const RELEASE_METADATA_URL: &str = "https://nclatest.znin.net/";

/// Installed runtime classified against the latest release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuntimeStatus {
    Missing,
    Outdated { local: String, remote: String },
    Latest { version: String },
}

impl RuntimeStatus {
    pub fn installed(&self) -> bool {
        matches!(self, RuntimeStatus::Outdated { .. } | RuntimeStatus::Latest { .. })
    }
}

fn parse_numeric_version_parts(raw: &str) -> Vec<u64> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        // Digit-only segments fail to parse only on overflow.
        .map(|segment| segment.parse::<u64>().unwrap_or(u64::MAX))
        .collect()
}

/// Numeric segment ordering: `4.2.10 > 4.2.9`, `1.0 == 1.0.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_numeric_version_parts(a);
    let b_parts = parse_numeric_version_parts(b);

    let max_len = a_parts.len().max(b_parts.len());
    for idx in 0..max_len {
        let a_val = a_parts.get(idx).copied().unwrap_or(0);
        let b_val = b_parts.get(idx).copied().unwrap_or(0);
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }

    Ordering::Equal
}

pub fn classify_runtime(local: Option<&str>, remote: &str) -> RuntimeStatus {
    let Some(local) = local else {
        return RuntimeStatus::Missing;
    };

    if compare_versions(local, remote) == Ordering::Less {
        RuntimeStatus::Outdated {
            local: local.to_string(),
            remote: remote.to_string(),
        }
    } else {
        RuntimeStatus::Latest {
            version: local.to_string(),
        }
    }
}

pub struct VersionProbe {
    client: Client,
    layout: InstallLayout,
    metadata_url: String,
}

impl VersionProbe {
    pub fn new(client: Client, layout: InstallLayout) -> Self {
        Self {
            client,
            layout,
            metadata_url: RELEASE_METADATA_URL.to_string(),
        }
    }

    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    /// Host version from its manifest, `None` if the host is not installed.
    pub async fn read_host_version(&self) -> InstallerResult<Option<String>> {
        let manifest: Option<HostManifest> =
            read_json_file(&self.layout.host_manifest()).await?;
        Ok(manifest.and_then(|m| m.version))
    }

    pub async fn read_local_runtime_version(&self) -> InstallerResult<Option<String>> {
        let manifest: Option<RuntimeManifest> =
            read_json_file(&self.layout.runtime_manifest()).await?;
        Ok(manifest.and_then(|m| m.version))
    }

    pub async fn fetch_remote_runtime_version(&self) -> InstallerResult<String> {
        debug!("Fetching latest runtime release from {}", self.metadata_url);

        let response = self.client.get(&self.metadata_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::DownloadFailed {
                url: self.metadata_url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let release: ReleaseInfo = serde_json::from_slice(&bytes)?;
        let version = release.version()?;

        info!("Latest runtime release is {}", version);
        Ok(version)
    }

    /// Without a local install the status is `Missing` and no request is made.
    pub async fn runtime_status(&self) -> InstallerResult<RuntimeStatus> {
        let Some(local) = self.read_local_runtime_version().await? else {
            return Ok(RuntimeStatus::Missing);
        };
        let remote = self.fetch_remote_runtime_version().await?;
        Ok(classify_runtime(Some(&local), &remote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::core::http::build_http_client;

    fn probe_in(root: &std::path::Path) -> VersionProbe {
        let layout = InstallLayout::new(
            root.join("app"),
            root.join("container"),
            root.join("staging"),
        );
        VersionProbe::new(build_http_client().unwrap(), layout)
    }

    #[test]
    fn numeric_ordering_is_not_lexicographic() {
        assert_eq!(compare_versions("4.2.9", "4.2.10"), Ordering::Less);
        assert_eq!(compare_versions("10.0.0", "9.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
    }

    #[test]
    fn classify_marks_older_local_as_outdated() {
        assert_eq!(
            classify_runtime(Some("4.2.9"), "4.2.10"),
            RuntimeStatus::Outdated {
                local: "4.2.9".into(),
                remote: "4.2.10".into()
            }
        );
        assert_eq!(
            classify_runtime(Some("4.2.10"), "4.2.10"),
            RuntimeStatus::Latest {
                version: "4.2.10".into()
            }
        );
        assert_eq!(classify_runtime(None, "4.2.10"), RuntimeStatus::Missing);
    }

    #[test]
    fn oversized_segment_keeps_its_position() {
        assert_eq!(
            compare_versions("4.99999999999999999999.0", "4.2.0"),
            Ordering::Greater
        );
        assert_eq!(
            compare_versions("4.2.99999999999999999999", "4.2.99999999999999999999"),
            Ordering::Equal
        );
    }

    fn join_segments(segments: &[u64]) -> String {
        segments
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn padded(segments: &[u64], len: usize) -> Vec<u64> {
        let mut out = segments.to_vec();
        out.resize(len, 0);
        out
    }

    proptest! {
        #[test]
        fn classification_follows_numeric_segment_order(
            local in prop::collection::vec(0u64..10_000, 1..6),
            remote in prop::collection::vec(0u64..10_000, 1..6),
        ) {
            let len = local.len().max(remote.len());
            let expected = padded(&local, len).cmp(&padded(&remote, len));
            let local_text = join_segments(&local);
            let remote_text = join_segments(&remote);

            prop_assert_eq!(compare_versions(&local_text, &remote_text), expected);
            prop_assert_eq!(compare_versions(&remote_text, &local_text), expected.reverse());

            let status = classify_runtime(Some(&local_text), &remote_text);
            if expected == Ordering::Less {
                prop_assert_eq!(
                    status,
                    RuntimeStatus::Outdated { local: local_text.clone(), remote: remote_text.clone() }
                );
            } else {
                prop_assert_eq!(status, RuntimeStatus::Latest { version: local_text.clone() });
            }
        }

        #[test]
        fn tag_prefix_and_suffix_do_not_change_order(
            segments in prop::collection::vec(0u64..10_000, 1..6),
        ) {
            let plain = join_segments(&segments);
            prop_assert_eq!(
                compare_versions(&format!("v{plain}"), &format!("{plain}-beta")),
                Ordering::Equal
            );
        }
    }

    #[tokio::test]
    async fn reads_host_and_runtime_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let probe = probe_in(dir.path());

        assert_eq!(probe.read_host_version().await.unwrap(), None);
        assert_eq!(probe.read_local_runtime_version().await.unwrap(), None);

        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::write(
            dir.path().join("app/package.json"),
            r#"{"version":"6.9.56-28418","main":"./application/app_launcher/index.js"}"#,
        )
        .unwrap();
        let runtime_dir = dir.path().join("container/Documents/napcat");
        std::fs::create_dir_all(&runtime_dir).unwrap();
        std::fs::write(runtime_dir.join("package.json"), r#"{"version":"4.2.10"}"#).unwrap();

        assert_eq!(
            probe.read_host_version().await.unwrap().as_deref(),
            Some("6.9.56-28418")
        );
        assert_eq!(
            probe.read_local_runtime_version().await.unwrap().as_deref(),
            Some("4.2.10")
        );
    }

    #[tokio::test]
    async fn fetches_remote_tag_without_prefix() {
        let server = MockServer::start_async().await;
        let latest = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).json_body(json!({ "tag_name": "v4.3.0" }));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let probe = probe_in(dir.path()).with_metadata_url(server.url("/"));

        assert_eq!(probe.fetch_remote_runtime_version().await.unwrap(), "4.3.0");
        latest.assert_async().await;
    }

    #[tokio::test]
    async fn remote_server_error_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(503);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let probe = probe_in(dir.path()).with_metadata_url(server.url("/"));

        let err = probe.fetch_remote_runtime_version().await.unwrap_err();
        assert!(matches!(
            err,
            InstallerError::DownloadFailed { status: 503, .. }
        ));
    }

    #[tokio::test]
    async fn missing_runtime_skips_the_network() {
        let server = MockServer::start_async().await;
        let latest = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).json_body(json!({ "tag_name": "v4.3.0" }));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let probe = probe_in(dir.path()).with_metadata_url(server.url("/"));

        assert_eq!(probe.runtime_status().await.unwrap(), RuntimeStatus::Missing);
        assert_eq!(latest.calls_async().await, 0);
    }
}
