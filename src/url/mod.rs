//! URL handling for discovered ad links
//!
//! Links found on listing pages are normalized before the producer decides
//! whether it has already queued them.

mod domain;
mod normalize;

pub use domain::{extract_host, same_host};
pub use normalize::normalize_url;
