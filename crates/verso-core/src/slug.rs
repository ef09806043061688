//! Slug derivation for post URLs.

use crate::error::DomainError;

/// Derive the URL slug for a title: lowercase, ASCII, hyphen-separated.
/// Titles with no sluggable characters are rejected; uniqueness is
/// enforced separately against the store.
pub fn derive_slug(title: &str) -> Result<String, DomainError> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        return Err(DomainError::validation(
            "Title must contain at least one alphanumeric character",
        ));
    }
    Ok(slug)
}
