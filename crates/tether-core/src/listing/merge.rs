//! Merging listings from several sources into one ranked list

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{OfficialListing, ServerListing};

/// Where an entry was first seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSource {
    Awesome,
    Official,
}

/// Section of the official README an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Reference,
    Integration,
    Community,
}

impl ListingKind {
    /// Reference servers and vendor integrations are official by default
    fn implies_official(self) -> bool {
        matches!(self, ListingKind::Reference | ListingKind::Integration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedServer {
    pub name: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub languages: Vec<String>,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub platforms: Vec<String>,

    pub is_official: bool,
    pub is_open_source: bool,

    #[serde(
        default,
        deserialize_with = "super::star_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub star_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    pub source: ListingSource,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ListingKind>,
}

/// Accumulates listing entries, merging duplicates by URL.
///
/// Entries keep the order in which they were first added. When an entry is
/// added again, non-empty fields of the newer entry replace the stored ones
/// and missing fields keep what was already known. Icon lists are replaced
/// whenever the newer entry carries one, even an empty one. The first source
/// wins.
#[derive(Debug, Default)]
pub struct ListingCollector {
    entries: Vec<MergedServer>,
    index: HashMap<String, usize>,
}

impl ListingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listing: &ServerListing, source: ListingSource, kind: Option<ListingKind>) {
        let key = merge_key(listing);

        match self.index.get(&key) {
            Some(&pos) => {
                debug!(url = %listing.url, "merging duplicate listing entry");
                merge_into(&mut self.entries[pos], listing, kind);
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(new_entry(listing, source, kind));
            }
        }
    }

    pub fn add_awesome(&mut self, servers: &[ServerListing]) {
        for server in servers {
            self.add(server, ListingSource::Awesome, None);
        }
    }

    pub fn add_official(&mut self, listing: &OfficialListing) {
        let sections = [
            (&listing.reference_servers, ListingKind::Reference),
            (&listing.third_party.official_integrations, ListingKind::Integration),
            (&listing.third_party.community_servers, ListingKind::Community),
        ];
        for (servers, kind) in sections {
            for server in servers {
                self.add(server, ListingSource::Official, Some(kind));
            }
        }
    }

    pub fn entries(&self) -> &[MergedServer] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<MergedServer> {
        self.entries
    }

    /// Entries with a known star count, most starred first.
    ///
    /// Ties keep insertion order.
    pub fn top_servers(&self, limit: usize) -> Vec<MergedServer> {
        let mut ranked: Vec<MergedServer> = self
            .entries
            .iter()
            .filter(|s| s.star_count.is_some())
            .cloned()
            .collect();
        ranked.sort_by(|a, b| b.star_count.cmp(&a.star_count));
        ranked.truncate(limit);
        ranked
    }
}

/// Merge the community list with the official README and rank the result
pub fn build_top_servers(
    awesome: &[ServerListing],
    official: &OfficialListing,
    limit: usize,
) -> Vec<MergedServer> {
    let mut collector = ListingCollector::new();
    collector.add_awesome(awesome);
    collector.add_official(official);
    debug!(merged = collector.len(), limit, "built merged server listing");
    collector.top_servers(limit)
}

fn merge_key(listing: &ServerListing) -> String {
    if listing.url.is_empty() {
        format!("{}|{}", listing.name.to_lowercase(), listing.url)
    } else {
        listing.url.to_lowercase()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn new_entry(listing: &ServerListing, source: ListingSource, kind: Option<ListingKind>) -> MergedServer {
    MergedServer {
        name: listing.name.clone(),
        url: listing.url.clone(),
        description: non_empty(&listing.description),
        category: listing.category.clone().filter(|c| !c.is_empty()),
        languages: listing.languages.clone().unwrap_or_default(),
        scopes: listing.scopes.clone().unwrap_or_default(),
        platforms: listing.platforms.clone().unwrap_or_default(),
        is_official: listing
            .is_official
            .unwrap_or_else(|| kind.is_some_and(ListingKind::implies_official)),
        is_open_source: listing.is_open_source.unwrap_or(false),
        star_count: listing.star_count,
        logo: listing.logo.clone().filter(|l| !l.is_empty()),
        source,
        kind,
    }
}

fn merge_into(existing: &mut MergedServer, listing: &ServerListing, kind: Option<ListingKind>) {
    if !listing.name.is_empty() {
        existing.name = listing.name.clone();
    }
    if !listing.url.is_empty() {
        existing.url = listing.url.clone();
    }
    if let Some(description) = non_empty(&listing.description) {
        existing.description = Some(description);
    }
    if let Some(category) = listing.category.as_ref().filter(|c| !c.is_empty()) {
        existing.category = Some(category.clone());
    }
    if let Some(logo) = listing.logo.as_ref().filter(|l| !l.is_empty()) {
        existing.logo = Some(logo.clone());
    }

    for (target, incoming) in [
        (&mut existing.languages, &listing.languages),
        (&mut existing.scopes, &listing.scopes),
        (&mut existing.platforms, &listing.platforms),
    ] {
        if let Some(list) = incoming {
            target.clone_from(list);
        }
    }

    if let Some(official) = listing.is_official {
        existing.is_official = official;
    }
    if let Some(open_source) = listing.is_open_source {
        existing.is_open_source = open_source;
    }
    if listing.star_count.is_some() {
        existing.star_count = listing.star_count;
    }
    if kind.is_some() {
        existing.kind = kind;
    }
}
