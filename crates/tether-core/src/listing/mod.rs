//! Public MCP server listings
//!
//! Parses the community "awesome" list and the official servers README,
//! merges entries from both by URL and ranks them by star count.

pub mod markdown;
pub mod merge;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use markdown::{parse_awesome_list, parse_official_list};
pub use merge::{ListingCollector, ListingKind, ListingSource, MergedServer, build_top_servers};

/// One server entry as found in a listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerListing {
    pub name: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Implementation languages; `None` when the listing does not say
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,

    /// Cloud / Local / Embedded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,

    /// Supported operating systems
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_official: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open_source: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Repository stars, filled in by whoever enriches the listing
    #[serde(
        default,
        deserialize_with = "star_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub star_count: Option<u64>,
}

/// Entries from the official servers README
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialListing {
    #[serde(default)]
    pub reference_servers: Vec<ServerListing>,

    #[serde(default)]
    pub third_party: ThirdPartyListing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyListing {
    #[serde(default)]
    pub official_integrations: Vec<ServerListing>,

    #[serde(default)]
    pub community_servers: Vec<ServerListing>,
}

const OPEN_SOURCE_HOSTS: &[&str] = &[
    "github.com",
    "gitlab.com",
    "gitea.com",
    "gitea.io",
    "bitbucket.org",
    "codeberg.org",
    "sourcehut.org",
    "sr.ht",
    "savannah.gnu.org",
    "git.sr.ht",
    "sourceforge.net",
    "launchpad.net",
];

const SELF_HOSTED_PATTERNS: &[&str] = &["/git/", "git.", "gitea.", "gitlab."];

/// Heuristic: does this URL point at a source repository?
///
/// Known forges and self-hosted forge patterns match anywhere in the URL.
/// Relative links (as used inside the official repository) count as open
/// source.
pub fn is_open_source_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    let lower = url.to_lowercase();
    if OPEN_SOURCE_HOSTS.iter().any(|host| lower.contains(host)) {
        return true;
    }

    if !url.starts_with("http") {
        return true;
    }

    SELF_HOSTED_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Star counts as written by enrichment scripts: integers or floats.
///
/// Floats are rounded. Negative or non-numeric values read as unknown rather
/// than failing the whole listing.
pub(crate) fn star_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| {
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64)
        })
    }))
}

/// Read a listing JSON file; a missing file yields the default value
pub fn load_listing_file<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read listing file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse listing file: {}", path.display()))
}

/// Write a listing as pretty-printed JSON
pub fn save_listing_file<T: Serialize>(path: &Path, listing: &T) -> anyhow::Result<()> {
    let content =
        serde_json::to_string_pretty(listing).context("Failed to serialize listing to JSON")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write listing file: {}", path.display()))
}
