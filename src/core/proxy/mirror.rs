// ─── Mirrors ───
// Named network paths to GitHub-hosted resources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyEndpoint {
    Direct,
    Moeyy,
    Ghproxy,
    GhProxy,
    Haod,
}

impl ProxyEndpoint {
    pub const ALL: [ProxyEndpoint; 5] = [
        ProxyEndpoint::Direct,
        ProxyEndpoint::Moeyy,
        ProxyEndpoint::Ghproxy,
        ProxyEndpoint::GhProxy,
        ProxyEndpoint::Haod,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProxyEndpoint::Direct => "direct",
            ProxyEndpoint::Moeyy => "moeyy",
            ProxyEndpoint::Ghproxy => "ghproxy",
            ProxyEndpoint::GhProxy => "gh-proxy",
            ProxyEndpoint::Haod => "haod",
        }
    }

    /// Default route of this endpoint.
    pub fn default_route(self) -> MirrorRoute {
        match self {
            ProxyEndpoint::Direct => MirrorRoute::Identity,
            ProxyEndpoint::Moeyy => MirrorRoute::Prefix("https://github.moeyy.xyz/".into()),
            ProxyEndpoint::Ghproxy => MirrorRoute::Prefix("https://mirror.ghproxy.com/".into()),
            ProxyEndpoint::GhProxy => MirrorRoute::Prefix("https://gh-proxy.com/".into()),
            ProxyEndpoint::Haod => MirrorRoute::Prefix("https://x.haod.me/".into()),
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProxyEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProxyEndpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown proxy '{s}', expected one of: {}",
                    ProxyEndpoint::ALL.map(ProxyEndpoint::name).join(", ")
                )
            })
    }
}

/// How a mirror turns a canonical resource URL into the URL it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorRoute {
    Identity,
    Prefix(String),
}

impl MirrorRoute {
    pub fn url_for(&self, resource: &str) -> String {
        match self {
            MirrorRoute::Identity => resource.to_string(),
            MirrorRoute::Prefix(prefix) => format!("{prefix}{resource}"),
        }
    }
}

/// The set of mirrors the resolver races and the installer downloads through.
#[derive(Debug, Clone)]
pub struct MirrorTable {
    routes: Vec<(ProxyEndpoint, MirrorRoute)>,
}

impl Default for MirrorTable {
    fn default() -> Self {
        Self {
            routes: ProxyEndpoint::ALL
                .into_iter()
                .map(|endpoint| (endpoint, endpoint.default_route()))
                .collect(),
        }
    }
}

impl MirrorTable {
    pub fn new(routes: Vec<(ProxyEndpoint, MirrorRoute)>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[(ProxyEndpoint, MirrorRoute)] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Endpoints missing from the table fall back to their default route.
    pub fn url_for(&self, endpoint: ProxyEndpoint, resource: &str) -> String {
        self.routes
            .iter()
            .find(|(candidate, _)| *candidate == endpoint)
            .map(|(_, route)| route.url_for(resource))
            .unwrap_or_else(|| endpoint.default_route().url_for(resource))
    }
}

/// User preference: race every mirror, or use one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ProxyChoice {
    #[default]
    Auto,
    Explicit(ProxyEndpoint),
}

impl fmt::Display for ProxyChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyChoice::Auto => f.write_str("auto"),
            ProxyChoice::Explicit(endpoint) => endpoint.fmt(f),
        }
    }
}

impl FromStr for ProxyChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(ProxyChoice::Auto);
        }
        s.parse().map(ProxyChoice::Explicit)
    }
}

impl From<ProxyChoice> for String {
    fn from(choice: ProxyChoice) -> Self {
        choice.to_string()
    }
}

impl TryFrom<String> for ProxyChoice {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET: &str =
        "https://github.com/NapNeko/NapCatQQ/releases/latest/download/NapCat.Shell.zip";

    #[test]
    fn direct_route_is_identity() {
        let table = MirrorTable::default();
        assert_eq!(table.url_for(ProxyEndpoint::Direct, ASSET), ASSET);
    }

    #[test]
    fn prefixed_routes_wrap_the_canonical_url() {
        let table = MirrorTable::default();
        assert_eq!(
            table.url_for(ProxyEndpoint::GhProxy, ASSET),
            format!("https://gh-proxy.com/{ASSET}")
        );
        assert_eq!(
            table.url_for(ProxyEndpoint::Haod, ASSET),
            format!("https://x.haod.me/{ASSET}")
        );
    }

    #[test]
    fn distinct_endpoints_give_distinct_urls() {
        let table = MirrorTable::default();
        let mut urls: Vec<String> = ProxyEndpoint::ALL
            .into_iter()
            .map(|endpoint| table.url_for(endpoint, ASSET))
            .collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), ProxyEndpoint::ALL.len());
    }

    #[test]
    fn choice_parses_names_and_auto() {
        assert_eq!("auto".parse::<ProxyChoice>().unwrap(), ProxyChoice::Auto);
        assert_eq!(
            "gh-proxy".parse::<ProxyChoice>().unwrap(),
            ProxyChoice::Explicit(ProxyEndpoint::GhProxy)
        );
        assert_eq!(
            "ghproxy".parse::<ProxyChoice>().unwrap(),
            ProxyChoice::Explicit(ProxyEndpoint::Ghproxy)
        );
        assert!("socks5".parse::<ProxyChoice>().is_err());
    }

    #[test]
    fn choice_serializes_as_plain_string() {
        let json = serde_json::to_string(&ProxyChoice::Explicit(ProxyEndpoint::Moeyy)).unwrap();
        assert_eq!(json, "\"moeyy\"");
        let back: ProxyChoice = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(back, ProxyChoice::Auto);
    }
}
