//! OS platforms and the device-identifier classifier.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use static_init::dynamic;

use crate::errors::StoreBotError;

/// Board-style model codes such as `J413AP` or `Z1234`-like Mac identifiers.
#[dynamic]
static MAC_MODEL_CODE: Regex =
    Regex::new(r"(?i)^[A-Z]\d{3}[A-Z]{2}AP$").expect("constant regex compiles");

/// An operating system tracked by the firmware manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    /// iPhone and iPod touch.
    #[serde(rename = "iOS")]
    Ios,
    /// iPad.
    #[serde(rename = "iPadOS")]
    IpadOs,
    /// Mac.
    #[serde(rename = "macOS")]
    MacOs,
    /// Apple Watch.
    #[serde(rename = "watchOS")]
    WatchOs,
    /// Apple TV and HomePod.
    #[serde(rename = "tvOS")]
    TvOs,
    /// Vision Pro.
    #[serde(rename = "visionOS")]
    VisionOs,
}

impl Platform {
    /// Every platform, in the order summaries list them.
    pub const ALL: [Platform; 6] = [
        Platform::Ios,
        Platform::IpadOs,
        Platform::MacOs,
        Platform::WatchOs,
        Platform::TvOs,
        Platform::VisionOs,
    ];

    /// Canonical display name, also used in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::IpadOs => "iPadOS",
            Platform::MacOs => "macOS",
            Platform::WatchOs => "watchOS",
            Platform::TvOs => "tvOS",
            Platform::VisionOs => "visionOS",
        }
    }

    /// Maps user-facing aliases ("iphone", "mac", "apple tv", ...) to a platform.
    pub fn normalize(input: &str) -> Option<Platform> {
        match input.trim().to_lowercase().as_str() {
            "ios" | "iphoneos" | "iphone" => Some(Platform::Ios),
            "ipados" | "ipad" => Some(Platform::IpadOs),
            "macos" | "mac" | "osx" => Some(Platform::MacOs),
            "watchos" | "watch" => Some(Platform::WatchOs),
            "tvos" | "apple tv" | "tv" => Some(Platform::TvOs),
            "visionos" | "vision" => Some(Platform::VisionOs),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = StoreBotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::normalize(s).ok_or_else(|| StoreBotError::InvalidInput(format!("unknown platform: {s}")))
    }
}

fn classify_one(device: &str) -> Option<Platform> {
    let d = device.to_lowercase();
    if d.starts_with("iphone") || d.starts_with("ipod") {
        Some(Platform::Ios)
    } else if d.starts_with("ipad") {
        Some(Platform::IpadOs)
    } else if d.starts_with("watch") {
        Some(Platform::WatchOs)
    } else if d.starts_with("appletv") || d.starts_with("audioaccessory") {
        Some(Platform::TvOs)
    } else if d.starts_with('j')
        || d.starts_with("mac-")
        || d.contains("macos")
        || d.starts_with("vmm")
        || d.starts_with("x86")
        || MAC_MODEL_CODE.is_match(device)
    {
        Some(Platform::MacOs)
    } else if d.starts_with("realitydevice") {
        Some(Platform::VisionOs)
    } else {
        None
    }
}

/// Derives the platform set of a manifest node from its device identifiers.
///
/// Pure function of the identifiers; unknown identifiers contribute nothing.
pub fn classify_devices<S: AsRef<str>>(devices: &[S]) -> BTreeSet<Platform> {
    devices
        .iter()
        .filter_map(|d| classify_one(d.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_each_family() {
        let cases = [
            ("iPhone15,2", Platform::Ios),
            ("iPod9,1", Platform::Ios),
            ("iPad13,18", Platform::IpadOs),
            ("Watch7,1", Platform::WatchOs),
            ("AppleTV14,1", Platform::TvOs),
            ("AudioAccessory6,1", Platform::TvOs),
            ("RealityDevice14,1", Platform::VisionOs),
            ("J413AP", Platform::MacOs),
            ("Mac-827FAC58A8FDFA22", Platform::MacOs),
            ("VMM-x86_64", Platform::MacOs),
            ("x86legacyap", Platform::MacOs),
            ("Z123ABAP", Platform::MacOs),
        ];
        for (device, expected) in cases {
            assert_eq!(classify_devices(&[device]), BTreeSet::from([expected]), "{device}");
        }
    }

    #[test]
    fn mixed_lists_yield_every_platform_once() {
        let set = classify_devices(&["iPhone14,2", "iPad8,1", "iPhone15,3", "unknown"]);
        assert_eq!(set, BTreeSet::from([Platform::Ios, Platform::IpadOs]));
        assert!(classify_devices::<&str>(&[]).is_empty());
    }

    #[test]
    fn normalizes_aliases() {
        assert_eq!(Platform::normalize(" iPhone "), Some(Platform::Ios));
        assert_eq!(Platform::normalize("Apple TV"), Some(Platform::TvOs));
        assert_eq!(Platform::normalize("OSX"), Some(Platform::MacOs));
        assert_eq!(Platform::normalize("android"), None);
        assert!("android".parse::<Platform>().is_err());
    }
}
