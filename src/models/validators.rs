use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;
use validator::ValidationError;

/// Regex for validating URL-friendly slugs (lowercase alphanumeric with hyphens).
/// Examples: "acme", "acme-inc", "team-42"
pub static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;

/// Validate an organization or project name with a precise per-bound message.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len < NAME_MIN {
        let mut err = ValidationError::new("name_too_short");
        err.message = Some(Cow::Owned(format!(
            "Name must be at least {} characters",
            NAME_MIN
        )));
        return Err(err);
    }
    if len > NAME_MAX {
        let mut err = ValidationError::new("name_too_long");
        err.message = Some(Cow::Owned(format!(
            "Name must be at most {} characters",
            NAME_MAX
        )));
        return Err(err);
    }
    Ok(())
}

const SLUG_MIN: usize = 2;
const SLUG_MAX: usize = 50;

/// Validate a user-supplied slug.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let len = slug.chars().count();
    if !(SLUG_MIN..=SLUG_MAX).contains(&len) {
        let mut err = ValidationError::new("slug_length");
        err.message = Some(Cow::Owned(format!(
            "Slug must be between {} and {} characters",
            SLUG_MIN, SLUG_MAX
        )));
        return Err(err);
    }
    if !SLUG_REGEX.is_match(slug) {
        let mut err = ValidationError::new("slug_format");
        err.message = Some(Cow::Borrowed(
            "Slug must be lowercase letters, numbers, and hyphens only",
        ));
        return Err(err);
    }
    Ok(())
}

/// Derive a URL-friendly slug from a display name.
/// Lowercases, keeps alphanumeric runs, and joins them with hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
