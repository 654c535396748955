//! Structured ad records extracted from detail pages
//!
//! An [`AdRecord`] carries the business fields of one listing. Its
//! [`content_hash`](AdRecord::content_hash) is the identity used by the
//! dedup store.

mod fields;
mod hash;

pub use fields::{clean_text, parse_area, parse_price, parse_rooms};
pub use hash::content_hash;

/// One real-estate ad as extracted from its detail page
#[derive(Debug, Clone, PartialEq)]
pub struct AdRecord {
    /// Detail page the record was extracted from
    pub url: String,

    /// Property category the page was verified against
    pub category: String,

    pub title: String,

    /// Asking price in the site's currency units
    pub price: Option<u64>,

    /// Living area in square metres
    pub area_sqm: Option<f64>,

    pub rooms: Option<u32>,

    pub location: Option<String>,

    pub amenities: Vec<String>,

    /// Agency or owner contact as printed on the page
    pub contact: Option<String>,

    /// The site's own reference code for the ad
    pub reference: Option<String>,
}

impl AdRecord {
    /// Creates a record with only the mandatory fields set
    pub fn new(url: impl Into<String>, category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            category: category.into(),
            title: title.into(),
            price: None,
            area_sqm: None,
            rooms: None,
            location: None,
            amenities: Vec::new(),
            contact: None,
            reference: None,
        }
    }

    /// Hex SHA-256 of the business fields, excluding the URL
    pub fn content_hash(&self) -> String {
        content_hash(self)
    }
}
