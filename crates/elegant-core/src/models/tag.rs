//! Tag normalization

/// Normalize a tag for storage: trimmed and lowercased.
///
/// Returns `None` for tags that are empty after trimming.
///
/// # Examples
///
/// ```
/// use elegant_core::models::normalize_tag;
///
/// assert_eq!(normalize_tag("  Home "), Some("home".to_string()));
/// assert_eq!(normalize_tag("   "), None);
/// ```
#[must_use]
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}
