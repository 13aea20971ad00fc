//! Filename sanitization for downloaded assets.

use crate::PLACEHOLDER_NAME;

/// Characters rejected by at least one common filesystem.
const INVALID_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Cleans a base name (no extension) for use on disk.
///
/// - Drops path-invalid and control characters
/// - Collapses whitespace runs into a single `_`
/// - Trims leading/trailing dots and spaces
/// - Falls back to [`PLACEHOLDER_NAME`] if nothing is left
pub fn sanitize_filename(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    let mut in_whitespace = false;

    for c in base.chars() {
        if INVALID_CHARS.contains(&c) || c.is_control() {
            continue;
        }
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() || base.trim().is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Splits `name.ext` into `("name", ".ext")`. Only the last path component can carry the
/// extension, and a leading dot doesn't start one.
pub fn split_extension(filename: &str) -> (&str, &str) {
    let last = filename.rfind(['/', '\\']).map_or(0, |idx| idx + 1);
    match filename[last..].rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(last + idx),
        _ => (filename, ""),
    }
}

/// The name a resolved file is written under: sanitized base plus the untouched extension.
pub fn target_filename(real_filename: &str) -> String {
    let (base, extension) = split_extension(real_filename);
    format!("{}{extension}", sanitize_filename(base))
}
