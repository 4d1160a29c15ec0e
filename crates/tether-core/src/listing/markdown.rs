//! Markdown listing parsers

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{OfficialListing, ServerListing, ThirdPartyListing, is_open_source_url};

const REFERENCE_BASE_URL: &str = "https://github.com/modelcontextprotocol/servers/tree/main/";

const REFERENCE_HEADING: &str = "## \u{1F31F} Reference Servers";
const INTEGRATIONS_HEADING: &str = "### \u{1F396}\u{FE0F} Official Integrations";
const COMMUNITY_HEADING: &str = "### \u{1F30E} Community Servers";

const OFFICIAL_MARKER: &str = "\u{1F396}\u{FE0F}";

const LANGUAGE_ICONS: &[(&str, &str)] = &[
    ("\u{1F40D}", "Python"),
    ("\u{1F4C7}", "TypeScript"),
    ("\u{1F3CE}\u{FE0F}", "Go"),
    ("\u{1F980}", "Rust"),
    ("#\u{FE0F}\u{20E3}", "C#"),
    ("\u{2615}", "Java"),
    ("\u{1F30A}", "C/C++"),
    ("\u{1F48E}", "Ruby"),
];

const SCOPE_ICONS: &[(&str, &str)] = &[
    ("\u{2601}\u{FE0F}", "Cloud"),
    ("\u{1F3E0}", "Local"),
    ("\u{1F4DF}", "Embedded"),
];

const PLATFORM_ICONS: &[(&str, &str)] = &[
    ("\u{1F34E}", "macOS"),
    ("\u{1FA9F}", "Windows"),
    ("\u{1F427}", "Linux"),
];

static AWESOME_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-\s*\[([^\]]+)\]\(([^)]+)\)(.*)$").expect("item pattern is valid")
});

static AWESOME_CATEGORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^###\s+(?:.*?>)?([^<]+)(?:</a>)?.*$").expect("category pattern is valid")
});

static LINKED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s+\*\*\[([^\]]+)\]\(([^)]+)\)\*\*\s+-\s+(?s:(.*))$")
        .expect("linked item pattern is valid")
});

static LOGO_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^-\s+(?:<img[^>]+src="([^"]+)"[^>]*>\s+)?\*\*\[([^\]]+)\]\(([^)]+)\)\*\*(?:\s+—|\s+-)\s+(?s:(.*))$"#,
    )
    .expect("logo item pattern is valid")
});

/// Parse the community list: `### Category` headings followed by
/// `- [name](url) <icons> - description` items.
pub fn parse_awesome_list(content: &str) -> Vec<ServerListing> {
    let mut servers = Vec::new();
    let mut category = String::new();

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = AWESOME_CATEGORY.captures(line) {
            category = caps[1].trim().to_string();
            continue;
        }

        let Some(caps) = AWESOME_ITEM.captures(line) else {
            continue;
        };
        let url = caps[2].trim().to_string();
        let rest = caps[3].trim();
        let (icons, description) = rest.split_once(" - ").unwrap_or((rest, ""));

        servers.push(ServerListing {
            name: caps[1].trim().to_string(),
            description: description.trim().to_string(),
            category: Some(category.clone()),
            languages: Some(icons_in(icons, LANGUAGE_ICONS)),
            scopes: Some(icons_in(icons, SCOPE_ICONS)),
            platforms: Some(icons_in(icons, PLATFORM_ICONS)),
            is_official: Some(icons.contains(OFFICIAL_MARKER)),
            is_open_source: Some(is_open_source_url(&url)),
            url,
            ..Default::default()
        });
    }

    servers
}

/// Parse the official servers README sections
pub fn parse_official_list(content: &str) -> OfficialListing {
    let reference_servers = section(content, REFERENCE_HEADING, "##")
        .map(|body| {
            list_items(body)
                .iter()
                .filter_map(|item| LINKED_ITEM.captures(item))
                .map(|caps| {
                    let url = caps[2].trim();
                    ServerListing {
                        name: caps[1].trim().to_string(),
                        url: expand_reference_url(url),
                        description: flatten(&caps[3]),
                        is_open_source: Some(is_open_source_url(url)),
                        ..Default::default()
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let official_integrations = section(content, INTEGRATIONS_HEADING, "###")
        .map(|body| {
            list_items(body)
                .iter()
                .filter_map(|item| LOGO_ITEM.captures(item))
                .map(|caps| {
                    let url = caps[3].trim().to_string();
                    ServerListing {
                        name: caps[2].trim().to_string(),
                        description: flatten(&caps[4]),
                        logo: caps.get(1).map(|m| m.as_str().trim().to_string()),
                        is_open_source: Some(is_open_source_url(&url)),
                        url,
                        ..Default::default()
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let community_servers = section(content, COMMUNITY_HEADING, "##")
        .map(|body| {
            list_items(body)
                .iter()
                .filter_map(|item| LINKED_ITEM.captures(item))
                .map(|caps| {
                    let url = caps[2].trim().to_string();
                    ServerListing {
                        name: caps[1].trim().to_string(),
                        description: flatten(&caps[3]),
                        is_open_source: Some(is_open_source_url(&url)),
                        url,
                        ..Default::default()
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    OfficialListing {
        reference_servers,
        third_party: ThirdPartyListing {
            official_integrations,
            community_servers,
        },
    }
}

fn icons_in(icons: &str, table: &[(&str, &str)]) -> Vec<String> {
    table
        .iter()
        .filter(|(icon, _)| icons.contains(icon))
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Text after `heading` up to the next `terminator`
fn section<'a>(content: &'a str, heading: &str, terminator: &str) -> Option<&'a str> {
    let start = content.find(heading)? + heading.len();
    let body = &content[start..];
    Some(body.find(terminator).map_or(body, |end| &body[..end]))
}

/// Split a section into list items. An item starts at a line beginning with
/// `-` and runs until the next such line or a blank line.
fn list_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current: Option<String> = None;

    for line in body.lines() {
        if line.starts_with('-') {
            items.extend(current.take());
            current = Some(line.to_string());
        } else if line.trim().is_empty() {
            items.extend(current.take());
        } else if let Some(item) = current.as_mut() {
            item.push('\n');
            item.push_str(line);
        }
    }
    items.extend(current);
    items
}

fn flatten(description: &str) -> String {
    description.trim().replace('\n', " ")
}

/// Resolve a README-relative link against the upstream tree. Dot segments are
/// normalized so `./src/git` and `src/git` expand to the same URL.
fn expand_reference_url(url: &str) -> String {
    if url.starts_with("http") {
        return url.to_string();
    }
    Url::parse(REFERENCE_BASE_URL)
        .and_then(|base| base.join(url))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{}", REFERENCE_BASE_URL, url))
}
