//! Display helpers shared by the price, detail and icon reports.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use super::search::AppRecord;

/// Human price label: the store's own formatted price when present, else
/// "Free" for zero, else `"{currency} {amount}"`.
pub fn price_label(app: &AppRecord) -> String {
    if let Some(label) = app.formatted_price.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return label.to_string();
    }
    match app.price {
        Some(p) if p <= 0.0 => "Free".to_string(),
        Some(p) => format!("{} {:.2}", app.currency.as_deref().unwrap_or(""), p)
            .trim_start()
            .to_string(),
        None => "Unknown".to_string(),
    }
}

/// Binary-unit size, one decimal place above bytes.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Rewrites a 100px artwork URL to its 1024px variant. Returns `None` when
/// the URL does not follow the store's size-suffix scheme.
pub fn high_res_artwork(url100: &str) -> Option<String> {
    url100
        .contains("100x100bb")
        .then(|| url100.replace("100x100bb", "1024x1024bb"))
}

/// Store timestamps are RFC 3339 UTC; occasionally just a date.
pub fn parse_store_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

/// `YYYY-MM-DD` in the display zone.
pub fn local_ymd(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// Parses a zone name, falling back to UTC for anything unknown.
pub fn display_zone(name: &str) -> Tz {
    name.parse().unwrap_or(Tz::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_prices() {
        let free = AppRecord { price: Some(0.0), formatted_price: Some("Free".into()), ..AppRecord::default() };
        let paid = AppRecord { price: Some(4.99), formatted_price: Some("$4.99".into()), ..AppRecord::default() };
        let bare = AppRecord { price: Some(30.0), currency: Some("CNY".into()), ..AppRecord::default() };
        assert_eq!(price_label(&free), "Free");
        assert_eq!(price_label(&paid), "$4.99");
        assert_eq!(price_label(&bare), "CNY 30.00");
        assert_eq!(price_label(&AppRecord::default()), "Unknown");
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(250 * 1024 * 1024), "250.0 MB");
    }

    #[test]
    fn upgrades_artwork() {
        assert_eq!(
            high_res_artwork("https://is1.mzstatic.com/a/100x100bb.jpg").as_deref(),
            Some("https://is1.mzstatic.com/a/1024x1024bb.jpg")
        );
        assert_eq!(high_res_artwork("https://x/other.png"), None);
    }

    #[test]
    fn converts_to_display_zone() {
        let at = parse_store_date("2024-03-01T18:30:00Z").unwrap();
        assert_eq!(local_ymd(at, display_zone("Asia/Shanghai")), "2024-03-02");
        assert_eq!(local_ymd(at, display_zone("Not/AZone")), "2024-03-01");
        assert!(parse_store_date("2024-03-01").is_some());
        assert!(parse_store_date("yesterday").is_none());
    }
}
