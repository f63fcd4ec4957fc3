//! File management module for sharebox.
//!
//! - Upload type checks against the configured allow-list
//! - File metadata records
//! - File storage with UUID naming

mod metadata;
mod storage;

pub use metadata::{locator, stored_name_from_locator, FileRecord, FileRepository, NewFile, MEDIA_URL};
pub use storage::{is_safe_stored_name, FileStorage};

use std::path::Path;

use crate::{Result, ShareboxError};

/// Maximum length for an uploaded filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Human-readable list of allowed extensions: `.pptx, .docx, and .xlsx`.
pub fn describe_extensions(allowed: &[String]) -> String {
    let dotted: Vec<String> = allowed.iter().map(|e| format!(".{e}")).collect();
    match dotted.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

/// Check an uploaded filename against the allow-list (case-insensitive).
///
/// Returns the lowercased extension on success.
pub fn check_extension(filename: &str, allowed: &[String]) -> Result<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);

    match ext {
        Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(ext),
        _ => Err(ShareboxError::UnsupportedFileType {
            allowed: describe_extensions(allowed),
        }),
    }
}

/// Reduce a client-supplied filename to its last path component.
pub fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}
