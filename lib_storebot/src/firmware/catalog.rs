//! # Release Catalog
//!
//! Scans the manifest's asset-set containers for release nodes matching one
//! platform. The manifest schema is undocumented and only inferred from
//! observation, so extraction is best-effort: field names come from priority
//! lists, unknown node shapes are logged and skipped, and a missing or
//! malformed document simply yields no releases.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::platform::{classify_devices, Platform};

/// Top-level containers, scanned in this order.
pub const CONTAINER_NAMES: [&str; 2] = ["PublicAssetSets", "AssetSets"];

const VERSION_FIELDS: [&str; 3] = ["ProductVersion", "OSVersion", "SystemVersion"];
const BUILD_FIELDS: [&str; 3] = ["Build", "BuildID", "BuildVersion"];
const DATE_FIELDS: [&str; 5] = ["PostingDate", "ReleaseDate", "Date", "PublishedDate", "PublicationDate"];
const DEVICES_FIELD: &str = "SupportedDevices";

/// iPadOS became a separate manifest tag with this version; older iPad
/// builds only ever appear under iPhone device lists.
const IPADOS_FIRST_VERSION: f64 = 13.0;

/// Release channel guessed from the raw node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stability {
    /// General release.
    Stable,
    /// Developer or public beta.
    Beta,
    /// Release candidate or seed.
    ReleaseCandidate,
}

/// One OS release for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub platform: Platform,
    /// Dotted numeric version such as "17.5.1".
    pub version: String,
    /// Opaque build identifier, unique within one platform's list.
    pub build: String,
    pub release_date: Option<DateTime<Utc>>,
    pub stability: Stability,
}

/// Collects the releases of `platform` in container/array scan order.
///
/// The first node carrying a given build wins. A document that is not an
/// object, or that has none of the known containers, yields an empty list.
pub fn collect_releases(manifest: &Value, platform: Platform) -> Vec<Release> {
    let Some(root) = manifest.as_object() else {
        debug!("manifest is not a JSON object");
        return Vec::new();
    };

    let mut releases = Vec::new();
    let mut seen_builds: HashSet<String> = HashSet::new();

    for name in CONTAINER_NAMES {
        let Some(container) = root.get(name).and_then(Value::as_object) else {
            continue;
        };
        // Device-source grouping keys carry no meaning for classification.
        for nodes in container.values().filter_map(Value::as_array) {
            for node in nodes {
                let Some(release) = release_from_node(node, platform) else {
                    continue;
                };
                if seen_builds.insert(release.build.clone()) {
                    releases.push(release);
                }
            }
        }
    }

    releases
}

fn release_from_node(node: &Value, platform: Platform) -> Option<Release> {
    let Some(fields) = node.as_object() else {
        debug!(node = %node, "skipping non-object manifest node");
        return None;
    };

    let (Some(version), Some(build)) = (first_text(fields, &VERSION_FIELDS), first_text(fields, &BUILD_FIELDS)) else {
        debug!(keys = ?fields.keys().collect::<Vec<_>>(), "skipping manifest node without version/build");
        return None;
    };

    let devices: Vec<&str> = fields
        .get(DEVICES_FIELD)
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let platforms = classify_devices(&devices);

    if !belongs_to(&platforms, platform, &version) {
        return None;
    }

    let release_date = first_text(fields, &DATE_FIELDS).and_then(|raw| parse_release_date(&raw));

    Some(Release {
        platform,
        version,
        build,
        release_date,
        stability: stability_hint(node),
    })
}

fn belongs_to(platforms: &BTreeSet<Platform>, target: Platform, version: &str) -> bool {
    if platforms.contains(&target) {
        return true;
    }
    target == Platform::IpadOs
        && platforms.len() == 1
        && platforms.contains(&Platform::Ios)
        && leading_number(version).is_some_and(|v| v >= IPADOS_FIRST_VERSION)
}

/// First non-empty string (or number) among `names`.
fn first_text(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match fields.get(*name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// The `major.minor` prefix of a version as a float, e.g. "13.0.1" -> 13.0.
fn leading_number(version: &str) -> Option<f64> {
    let trimmed = version.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '0'..='9' => end = idx + 1,
            '.' if !seen_dot && end > 0 => seen_dot = true,
            _ => break,
        }
    }
    if end == 0 {
        return None;
    }
    trimmed[..end].parse().ok()
}

fn parse_release_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        Err(_) => {
            debug!(raw, "unrecognised release date");
            None
        }
    }
}

/// Guesses the release channel from the serialized node.
///
/// "beta" anywhere marks a beta; otherwise "rc" or "seed" marks a release
/// candidate. Kept separate so it can be swapped for real schema fields.
pub fn stability_hint(node: &Value) -> Stability {
    let raw = node.to_string().to_lowercase();
    if raw.contains("beta") {
        Stability::Beta
    } else if raw.contains("rc") || raw.contains("seed") {
        Stability::ReleaseCandidate
    } else {
        Stability::Stable
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Num(&'a str),
    Text(String),
}

fn chunks(version: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = version.as_bytes();
    while start < bytes.len() {
        let numeric = bytes[start].is_ascii_digit();
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() == numeric {
            end += 1;
        }
        // Both ASCII digits and non-digits split on char boundaries here,
        // because multi-byte UTF-8 sequences never contain ASCII digits.
        let piece = &version[start..end];
        if numeric {
            out.push(Chunk::Num(piece.trim_start_matches('0')));
        } else {
            out.push(Chunk::Text(piece.to_lowercase()));
        }
        start = end;
    }
    out
}

/// Numeric-aware comparison: "17.10" > "17.9" and "17.5.1" > "17.5".
///
/// Only identical strings compare equal.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (left, right) = (chunks(a), chunks(b));
    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Chunk::Num(x), Chunk::Num(y)) => x.len().cmp(&y.len()).then_with(|| x.cmp(y)),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            (Chunk::Num(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Num(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    // Spellings that normalize alike ("17.05" vs "17.5") still get a fixed order.
    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

/// Latest-first ordering: release date descending (undated last), then
/// version descending.
pub fn latest_first(a: &Release, b: &Release) -> Ordering {
    let da = a.release_date.unwrap_or(DateTime::<Utc>::MIN_UTC);
    let db = b.release_date.unwrap_or(DateTime::<Utc>::MIN_UTC);
    db.cmp(&da).then_with(|| compare_versions(&b.version, &a.version))
}

/// Sorts in place so index 0 is the latest release.
pub fn sort_latest_first(releases: &mut [Release]) {
    releases.sort_by(latest_first);
}
