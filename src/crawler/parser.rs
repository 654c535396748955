//! HTML extraction for listing and detail pages
//!
//! This module turns fetched HTML into:
//! - Ad links found on a listing page
//! - The "load more" / next-page link of a listing page
//! - A structured [`AdRecord`] from a detail page
//!
//! All selectors come from the source's configuration; nothing here knows
//! about a particular site.

use crate::config::SelectorConfig;
use crate::crawler::FetchError;
use crate::record::{clean_text, parse_area, parse_price, parse_rooms, AdRecord};
use crate::SweepError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled selectors for one source site
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    pub ad_link: Selector,
    pub load_more: Option<Selector>,
    pub page_param: Option<String>,
    pub category: Option<Selector>,
    pub title: Selector,
    pub price: Option<Selector>,
    pub area: Option<Selector>,
    pub rooms: Option<Selector>,
    pub location: Option<Selector>,
    pub amenities: Option<Selector>,
    pub contact: Option<Selector>,
    pub reference: Option<Selector>,
}

impl SiteSelectors {
    /// Compiles every selector of a source
    pub fn compile(config: &SelectorConfig) -> Result<Self, SweepError> {
        Ok(Self {
            ad_link: compile(&config.ad_link)?,
            load_more: compile_opt(&config.load_more)?,
            page_param: config.page_param.clone(),
            category: compile_opt(&config.category)?,
            title: compile(&config.title)?,
            price: compile_opt(&config.price)?,
            area: compile_opt(&config.area)?,
            rooms: compile_opt(&config.rooms)?,
            location: compile_opt(&config.location)?,
            amenities: compile_opt(&config.amenities)?,
            contact: compile_opt(&config.contact)?,
            reference: compile_opt(&config.reference)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, SweepError> {
    Selector::parse(selector).map_err(|e| SweepError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn compile_opt(selector: &Option<String>) -> Result<Option<Selector>, SweepError> {
    selector.as_deref().map(compile).transpose()
}

/// Extracts the ad links of a listing page as absolute URLs
///
/// Links are returned in document order; duplicates within the page are kept
/// and left to the producer's seen-set.
pub fn extract_ad_links(html: &str, base_url: &Url, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Finds the "load more" / next-page link of a listing page
pub fn find_next_link(html: &str, base_url: &Url, selector: &Selector) -> Option<Url> {
    let document = Html::parse_document(html);

    let href = document
        .select(selector)
        .find_map(|element| element.value().attr("href"))?;

    resolve_link(href, base_url).and_then(|link| Url::parse(&link).ok())
}

/// Extracts a structured record from a detail page
///
/// # Returns
///
/// * `Ok(AdRecord)` - The page is an ad of the expected category
/// * `Err(FetchError::CategoryMismatch)` - The category element is missing or
///   does not mention `expected_category`
/// * `Err(FetchError::MissingField)` - The page has no title
pub fn extract_ad_record(
    html: &str,
    url: &str,
    selectors: &SiteSelectors,
    expected_category: &str,
) -> Result<AdRecord, FetchError> {
    let document = Html::parse_document(html);

    if let Some(category_selector) = &selectors.category {
        let category_text = document
            .select(category_selector)
            .map(element_text)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if !category_text.contains(&expected_category.to_lowercase()) {
            return Err(FetchError::CategoryMismatch {
                url: url.to_string(),
                expected: expected_category.to_string(),
            });
        }
    }

    let title = first_text(&document, Some(&selectors.title)).ok_or_else(|| {
        FetchError::MissingField {
            url: url.to_string(),
            field: "title",
        }
    })?;

    let mut record = AdRecord::new(url, expected_category, title);
    record.price = first_text(&document, selectors.price.as_ref()).and_then(|t| parse_price(&t));
    record.area_sqm = first_text(&document, selectors.area.as_ref()).and_then(|t| parse_area(&t));
    record.rooms = first_text(&document, selectors.rooms.as_ref()).and_then(|t| parse_rooms(&t));
    record.location = first_text(&document, selectors.location.as_ref());
    record.contact = first_text(&document, selectors.contact.as_ref());
    record.reference = first_text(&document, selectors.reference.as_ref());

    if let Some(amenities) = &selectors.amenities {
        record.amenities = document
            .select(amenities)
            .filter_map(|element| clean_text(&element_text(element)))
            .collect();
    }

    Ok(record)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Text of the first element matching `selector`, whitespace-collapsed
fn first_text(document: &Html, selector: Option<&Selector>) -> Option<String> {
    let selector = selector?;
    document
        .select(selector)
        .find_map(|element| clean_text(&element_text(element)))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}
