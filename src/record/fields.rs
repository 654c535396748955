//! Parsing of loosely formatted listing fields
//!
//! Sites print prices as "€ 250.000", areas as "72,5 m²" and rooms as
//! "3 bedrooms"; these helpers pull the numbers out.

/// Collapses runs of whitespace and trims; returns None for blank text
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Reads a price, treating every non-digit as a separator
///
/// Cents are not supported; "250.000,00" would read as 25000000.
pub fn parse_price(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Reads the first decimal number; a comma is accepted as decimal separator
pub fn parse_area(raw: &str) -> Option<f64> {
    let mut number = String::new();
    let mut seen_separator = false;

    for c in raw.chars() {
        if c.is_ascii_digit() {
            number.push(c);
        } else if (c == '.' || c == ',') && !number.is_empty() && !seen_separator {
            number.push('.');
            seen_separator = true;
        } else if !number.is_empty() {
            break;
        }
    }

    let number = number.trim_end_matches('.');
    if number.is_empty() {
        return None;
    }
    number.parse().ok()
}

/// Reads the first integer
pub fn parse_rooms(raw: &str) -> Option<u32> {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
