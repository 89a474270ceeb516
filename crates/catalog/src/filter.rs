use serde::{Deserialize, Serialize};

use pawmart_core::Money;

/// Sort order for listing searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    /// Lenient parse used for query parameters: unknown values fall back to
    /// the default, matching the original marketplace behaviour.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "oldest" => SortOrder::Oldest,
            "price_asc" => SortOrder::PriceAsc,
            "price_desc" => SortOrder::PriceDesc,
            _ => SortOrder::Newest,
        }
    }
}

/// Search filter over available listings.
///
/// `search` is a free-text needle matched against title and breed; `species`
/// matches exactly (case-insensitive). Price bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub species: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub sort: SortOrder,
}

/// 1-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamp into a usable window: page at least 1, limit in 1..=MAX_LIMIT.
    pub fn normalize(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::normalize(None, None)
    }
}
