//! Boundary validation: identifiers and pagination.

use uuid::Uuid;

use crate::error::ValidationError;

/// Largest page size accepted by the dataset listing.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Length of the canonical hyphenated UUID form.
const HYPHENATED_LEN: usize = 36;

/// Parses a canonical hyphenated UUID (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
///
/// The simple, braced and URN forms are rejected.
pub fn parse_id(field: &'static str, value: &str) -> Result<Uuid, ValidationError> {
    if value.len() != HYPHENATED_LEN {
        return Err(ValidationError::invalid_id(field, value));
    }
    Uuid::try_parse(value).map_err(|_| ValidationError::invalid_id(field, value))
}

/// Parses every identifier, failing on the first malformed one.
pub fn parse_ids<S: AsRef<str>>(field: &'static str, values: &[S]) -> Result<Vec<Uuid>, ValidationError> {
    values
        .iter()
        .map(|value| parse_id(field, value.as_ref()))
        .collect()
}

/// Checks `0 <= page` and `1 <= page_size <= 1000`.
pub fn validate_pagination(page: i64, page_size: i64) -> Result<(u32, u32), ValidationError> {
    let page = u32::try_from(page).map_err(|_| ValidationError::InvalidPage(page))?;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ValidationError::InvalidPageSize {
            value: page_size,
            max: MAX_PAGE_SIZE,
        });
    }
    Ok((page, page_size as u32))
}
