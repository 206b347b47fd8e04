//! # Reports
//!
//! Display-ready results returned to the router. Each report is plain data
//! (serializable, so it can be cached) with a plain-text `Display`; chat
//! markup is the router's business.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::appstore::{ChartKind, ChartSource};
use crate::firmware::{Platform, Stability};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLine {
    pub rank: usize,
    pub name: String,
    /// `None` for blocked apps and feeds without links.
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartReport {
    pub region: String,
    pub kind: ChartKind,
    pub source: ChartSource,
    pub lines: Vec<ChartLine>,
}

impl fmt::Display for ChartReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Top {} apps ({})", self.kind.as_str(), self.region.to_uppercase())?;
        for line in &self.lines {
            match &line.link {
                Some(link) => writeln!(f, "{}. {} {}", line.rank, line.name, link)?,
                None => writeln!(f, "{}. {}", line.rank, line.name)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub query: String,
    pub app_id: String,
    pub name: String,
    pub store_url: Option<String>,
    pub region: String,
    pub label: String,
    /// Converted price in the home currency, e.g. "CNY 35.93".
    pub estimate: Option<String>,
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_heading(f, &self.query, &self.name, self.store_url.as_deref())?;
        writeln!(f, "Region: {}", self.region.to_uppercase())?;
        match &self.estimate {
            Some(estimate) => writeln!(f, "Price: {} (~ {})", self.label, estimate),
            None => writeln!(f, "Price: {}", self.label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDetail {
    pub query: String,
    pub app_id: String,
    pub name: String,
    pub store_url: Option<String>,
    pub rating: Option<f64>,
    pub size: Option<String>,
    /// Last update in the display timezone, `YYYY-MM-DD`.
    pub updated: Option<String>,
    pub version: Option<String>,
    pub minimum_os: Option<String>,
}

impl fmt::Display for AppDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_heading(f, &self.query, &self.name, self.store_url.as_deref())?;
        match self.rating {
            Some(r) => writeln!(f, "Rating: {r:.1}")?,
            None => writeln!(f, "Rating: n/a")?,
        }
        writeln!(f, "Size: {}", or_unknown(&self.size))?;
        writeln!(f, "Updated: {}", or_unknown(&self.updated))?;
        writeln!(f, "Version: {}", or_unknown(&self.version))?;
        match &self.minimum_os {
            Some(os) => writeln!(f, "Requires: iOS {os}+"),
            None => writeln!(f, "Requires: unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIcon {
    pub query: String,
    pub app_id: String,
    pub name: String,
    pub store_url: Option<String>,
    pub artwork_url: String,
    pub high_res: bool,
}

impl fmt::Display for AppIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_heading(f, &self.query, &self.name, self.store_url.as_deref())?;
        let what = if self.high_res { "High-resolution icon" } else { "Icon" };
        writeln!(f, "{what}: {}", self.artwork_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseLine {
    pub version: String,
    pub build: String,
    pub stability: Stability,
    pub date: Option<String>,
}

impl fmt::Display for ReleaseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.build)?;
        match self.stability {
            Stability::Beta => write!(f, " beta")?,
            Stability::ReleaseCandidate => write!(f, " RC")?,
            Stability::Stable => {}
        }
        if let Some(date) = &self.date {
            write!(f, " {date}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsSummaryLine {
    pub platform: Platform,
    pub latest: ReleaseLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsSummary {
    pub lines: Vec<OsSummaryLine>,
}

impl fmt::Display for OsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Latest OS releases")?;
        for line in &self.lines {
            writeln!(f, "- {} {}", line.platform, line.latest)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsDetail {
    pub platform: Platform,
    pub latest: ReleaseLine,
    /// Most recent first, latest included.
    pub recent: Vec<ReleaseLine>,
}

impl fmt::Display for OsDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} latest: {} ({})", self.platform, self.latest.version, self.latest.build)?;
        if self.latest.stability == Stability::Stable {
            writeln!(f, "Channel: release")?;
        }
        writeln!(f, "Date: {}", self.latest.date.as_deref().unwrap_or("unknown"))?;
        writeln!(f)?;
        writeln!(f, "Recent:")?;
        for line in &self.recent {
            writeln!(f, "- {line}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    /// `None` when the store could not be reached.
    pub key_count: Option<u64>,
    pub daily_limit: u32,
    pub checked_at: String,
}

impl fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: running")?;
        match self.key_count {
            Some(n) => writeln!(f, "Store keys: {n}")?,
            None => writeln!(f, "Store keys: unavailable")?,
        }
        writeln!(f, "Daily limit: {} per user", self.daily_limit)?;
        writeln!(f, "Checked at: {}", self.checked_at)
    }
}

/// Whatever an action produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "report", rename_all = "camelCase")]
pub enum ActionReply {
    Chart(ChartReport),
    Price(PriceQuote),
    Detail(AppDetail),
    Icon(AppIcon),
    OsSummary(OsSummary),
    OsDetail(OsDetail),
}

impl fmt::Display for ActionReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionReply::Chart(r) => fmt::Display::fmt(r, f),
            ActionReply::Price(r) => fmt::Display::fmt(r, f),
            ActionReply::Detail(r) => fmt::Display::fmt(r, f),
            ActionReply::Icon(r) => fmt::Display::fmt(r, f),
            ActionReply::OsSummary(r) => fmt::Display::fmt(r, f),
            ActionReply::OsDetail(r) => fmt::Display::fmt(r, f),
        }
    }
}

fn write_heading(f: &mut fmt::Formatter<'_>, query: &str, name: &str, url: Option<&str>) -> fmt::Result {
    writeln!(f, "Best match for \"{query}\": {name}")?;
    if let Some(url) = url {
        writeln!(f, "{url}")?;
    }
    writeln!(f)
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chart_lines_without_links_render_bare() {
        let report = ChartReport {
            region: "us".into(),
            kind: ChartKind::Free,
            source: ChartSource::Legacy,
            lines: vec![
                ChartLine { rank: 1, name: "Alpha".into(), link: Some("https://apps.apple.com/app/id1".into()) },
                ChartLine { rank: 2, name: "Blocked".into(), link: None },
            ],
        };
        assert_eq!(
            report.to_string(),
            "Top free apps (US)\n1. Alpha https://apps.apple.com/app/id1\n2. Blocked\n"
        );
    }

    #[test]
    fn release_lines_tag_channels() {
        let beta = ReleaseLine {
            version: "18.0".into(),
            build: "22A5282m".into(),
            stability: Stability::Beta,
            date: Some("2024-06-10".into()),
        };
        assert_eq!(beta.to_string(), "18.0 (22A5282m) beta 2024-06-10");
    }

    #[test]
    fn detail_handles_missing_fields() {
        let detail = AppDetail {
            query: "x".into(),
            app_id: "1".into(),
            name: "X".into(),
            store_url: None,
            rating: Some(4.6666),
            size: None,
            updated: None,
            version: Some("2.0".into()),
            minimum_os: None,
        };
        let text = detail.to_string();
        assert!(text.contains("Rating: 4.7"));
        assert!(text.contains("Size: unknown"));
        assert!(text.contains("Requires: unknown"));
    }
}
