use crate::record::AdRecord;
use sha2::{Digest, Sha256};

/// Computes the content address of a record
///
/// Fields are hashed in a fixed order, each prefixed with its byte length,
/// so no field value can spill into the next. Optional fields carry a
/// presence byte ahead of the value. Amenities are sorted so their page
/// order does not matter, and are written as a count followed by each
/// length-prefixed entry. The URL is not part of the hash: the same ad
/// relisted under a new URL maps to the same id.
pub fn content_hash(record: &AdRecord) -> String {
    let mut amenities: Vec<&str> = record.amenities.iter().map(String::as_str).collect();
    amenities.sort_unstable();

    let mut hasher = Sha256::new();
    write_field(&mut hasher, record.category.to_lowercase().as_bytes());
    write_field(&mut hasher, record.title.as_bytes());
    write_optional(&mut hasher, record.price.map(|p| p.to_string()));
    write_optional(&mut hasher, record.area_sqm.map(|a| format!("{:.2}", a)));
    write_optional(&mut hasher, record.rooms.map(|r| r.to_string()));
    write_optional(&mut hasher, record.location.as_deref());

    hasher.update((amenities.len() as u64).to_le_bytes());
    for amenity in amenities {
        write_field(&mut hasher, amenity.as_bytes());
    }

    write_optional(&mut hasher, record.contact.as_deref());
    write_optional(&mut hasher, record.reference.as_deref());
    hex::encode(hasher.finalize())
}

fn write_field(hasher: &mut Sha256, value: &[u8]) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value);
}

fn write_optional<T: AsRef<str>>(hasher: &mut Sha256, value: Option<T>) {
    match value {
        Some(value) => {
            hasher.update([1u8]);
            write_field(hasher, value.as_ref().as_bytes());
        }
        None => hasher.update([0u8]),
    }
}
