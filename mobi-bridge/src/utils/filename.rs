//! Filename helpers for artifacts derived from user-supplied document names.
//!
//! Document names arrive from chat clients verbatim, so they are sanitized
//! before being joined onto the upload directory: path separators and control
//! characters can never survive into an artifact name.

/// Characters that are invalid in filenames on at least one platform.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitize a document name for use as a single path component.
///
/// Invalid and control characters are replaced with `_` (consecutive
/// replacements collapse into one), leading/trailing spaces and dots are
/// trimmed, and an empty result becomes `"unnamed"`.
///
/// ```
/// use mobi_bridge::utils::filename::sanitize_filename;
///
/// assert_eq!(sanitize_filename("war/peace.fb2"), "war_peace.fb2");
/// assert_eq!(sanitize_filename(""), "unnamed");
/// ```
pub fn sanitize_filename(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut last_was_replacement = false;

    for c in input.chars() {
        if c.is_control() || INVALID_CHARS.contains(&c) {
            if !last_was_replacement {
                result.push('_');
                last_was_replacement = true;
            }
        } else {
            result.push(c);
            last_was_replacement = false;
        }
    }

    let trimmed = result.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.is_empty() {
        return "unnamed".to_string();
    }
    trimmed.to_string()
}

/// Lowercased suffix of `name` from its last dot, if any.
///
/// A dot-file such as `.fb2` is all extension.
pub fn extension_lowercase(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rfind('.').map(|idx| base[idx..].to_lowercase())
}

/// `name` without its final extension.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
