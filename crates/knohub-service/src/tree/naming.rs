//! Name, extension, size, and URL helpers for file items.

use knohub_core::traits::storage::blob_file_name;
use knohub_core::types::ResourceId;

/// Stored name for uploads that arrive without a usable file name.
pub const UNNAMED_FILE: &str = "unnamed_file";

/// Pick the display name for an uploaded file.
///
/// Only the final path segment of a client-supplied name is kept.
pub fn upload_name(raw: Option<&str>) -> String {
    let name = raw
        .map(|n| n.rsplit(['/', '\\']).next().unwrap_or(n).trim())
        .unwrap_or_default();
    match name {
        "" | "." | ".." => UNNAMED_FILE.to_string(),
        other => other.to_string(),
    }
}

/// Whether a user-chosen name would be split into path segments.
pub fn has_path_separator(name: &str) -> bool {
    name.contains(['/', '\\'])
}

/// Lowercase extension of an uploaded file name.
///
/// A leading dot does not start an extension (`.bashrc` has none).
pub fn upload_extension(name: &str) -> Option<String> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(name[idx + 1..].to_lowercase()),
        _ => None,
    }
}

/// Extension of a rename candidate, as written.
fn candidate_extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// Keep a file's extension across a rename.
///
/// When `current` is set and the candidate's extension differs from it
/// (case-insensitively), the candidate's base name gets `current` back.
pub fn pin_extension(candidate: &str, current: Option<&str>) -> String {
    let Some(current) = current.filter(|ext| !ext.is_empty()) else {
        return candidate.to_string();
    };

    match candidate_extension(candidate) {
        Some(ext) if ext.eq_ignore_ascii_case(current) => candidate.to_string(),
        Some(ext) => {
            let base = &candidate[..candidate.len() - ext.len() - 1];
            format!("{base}.{current}")
        }
        None => {
            let base = match candidate.rfind('.') {
                Some(idx) if idx > 0 => &candidate[..idx],
                _ => candidate,
            };
            format!("{base}.{current}")
        }
    }
}

/// Lowercase extension of a name after rename, when it has one.
pub fn renamed_extension(name: &str) -> Option<String> {
    candidate_extension(name).map(str::to_lowercase)
}

/// Human readable size using 1024-based units.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let value = bytes as f64;
    if bytes < 1024 {
        format!("{bytes}B")
    } else if value < MB {
        format!("{:.1}KB", value / KB)
    } else if value < GB {
        format!("{:.1}MB", value / MB)
    } else {
        format!("{:.1}GB", value / GB)
    }
}

/// Public download locator for a blob.
pub fn download_url(resource_id: ResourceId, storage_path: &str) -> String {
    format!(
        "/api/files/{resource_id}/download/{}",
        blob_file_name(storage_path)
    )
}
