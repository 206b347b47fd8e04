use std::fmt;

/// Top-level grouping of cached values; also selects the TTL tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    Chart,
    Price,
    Detail,
    Icon,
    Os,
}

impl CacheCategory {
    /// Tag used in keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::Chart => "chart",
            CacheCategory::Price => "price",
            CacheCategory::Detail => "detail",
            CacheCategory::Icon => "icon",
            CacheCategory::Os => "os",
        }
    }
}

/// A cache key of the form `{schema}:{category}:{part}:{part}...`.
///
/// Parts are normalized on the way in so that equivalent requests ("Things 3"
/// vs "things3") share an entry. Bumping the schema prefix orphans every
/// entry written under the old layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Starts a key with the schema prefix and category tag.
    pub fn new(schema: &str, category: CacheCategory) -> Self {
        Self(format!("{}:{}", schema.trim(), category.as_str()))
    }

    /// Appends a lower-cased part, e.g. a region code or platform name.
    pub fn part(mut self, value: &str) -> Self {
        self.0.push(':');
        self.0.push_str(&value.trim().to_lowercase());
        self
    }

    /// Appends a free-text part with case and all whitespace removed.
    pub fn term(mut self, value: &str) -> Self {
        self.0.push(':');
        self.0
            .extend(value.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase));
        self
    }

    /// The full key as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
