// ─── Proxy Resolver ───
// Races one reachability probe per mirror; the first success wins.

use std::time::Instant;

use reqwest::Client;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::mirror::{MirrorTable, ProxyChoice, ProxyEndpoint};
use crate::core::error::{InstallerError, InstallerResult};

/// Small file fetched through every mirror to test reachability.
pub const PROBE_RESOURCE: &str =
    "https://raw.githubusercontent.com/NapNeko/NapCatQQ/main/package.json";

pub struct ProxyResolver {
    client: Client,
    mirrors: MirrorTable,
    probe_resource: String,
}

impl ProxyResolver {
    pub fn new(client: Client, mirrors: MirrorTable) -> Self {
        Self {
            client,
            mirrors,
            probe_resource: PROBE_RESOURCE.to_string(),
        }
    }

    pub fn with_probe_resource(mut self, resource: impl Into<String>) -> Self {
        self.probe_resource = resource.into();
        self
    }

    pub async fn resolve(&self, choice: ProxyChoice) -> InstallerResult<ProxyEndpoint> {
        match choice {
            ProxyChoice::Auto => self.resolve_automatic().await,
            ProxyChoice::Explicit(endpoint) => Ok(self.resolve_explicit(endpoint)),
        }
    }

    pub fn resolve_explicit(&self, endpoint: ProxyEndpoint) -> ProxyEndpoint {
        endpoint
    }

    /// Probe every mirror concurrently and return the first to answer with a
    /// 2xx. The remaining probes are aborted as soon as a winner is known.
    ///
    /// Under racing latency the winner is not deterministic: two healthy
    /// mirrors may win on alternate calls.
    #[instrument(skip(self), fields(mirrors = self.mirrors.len()))]
    pub async fn resolve_automatic(&self) -> InstallerResult<ProxyEndpoint> {
        let started = Instant::now();
        let mut probes = JoinSet::new();

        for (endpoint, route) in self.mirrors.routes() {
            let client = self.client.clone();
            let endpoint = *endpoint;
            let url = route.url_for(&self.probe_resource);
            probes.spawn(async move {
                probe_mirror(&client, &url).await?;
                Ok::<_, InstallerError>(endpoint)
            });
        }

        let mut last_error: Option<InstallerError> = None;
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(Ok(endpoint)) => {
                    probes.abort_all();
                    info!(
                        "Mirror {} answered first after {:?}",
                        endpoint,
                        started.elapsed()
                    );
                    return Ok(endpoint);
                }
                Ok(Err(error)) => {
                    debug!("Mirror probe failed: {}", error);
                    last_error = Some(error);
                }
                Err(join_error) => {
                    last_error = Some(InstallerError::Other(format!(
                        "Mirror probe task failed: {join_error}"
                    )));
                }
            }
        }

        warn!("No mirror reachable after {:?}", started.elapsed());
        Err(InstallerError::AllMirrorsUnreachable {
            attempted: self.mirrors.len(),
            last: Box::new(
                last_error.unwrap_or_else(|| InstallerError::Other("No mirrors configured".into())),
            ),
        })
    }
}

async fn probe_mirror(client: &Client, url: &str) -> InstallerResult<()> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(InstallerError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response.bytes().await?;
    Ok(())
}
