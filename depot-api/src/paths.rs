//! Client-side path validation
//!
//! Upload names travel to the server as volume-relative paths (folder
//! uploads keep their directory structure), and download filenames come
//! back from a header the server controls. Both are checked here before
//! they touch the wire or the local filesystem. The server re-validates;
//! this keeps bad batches from ever starting a transfer.

/// Check that an upload name is a safe volume-relative path.
///
/// Accepts forward-slash-separated relative paths. Rejects empty names,
/// control characters, absolute paths (Unix or Windows style), drive
/// letters, and any `.` or `..` component.
pub fn is_safe_relative_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    if path.chars().any(|c| c.is_ascii_control()) {
        return false;
    }

    if path.starts_with('/') || path.starts_with('\\') {
        return false;
    }

    // Windows drive letters ("C:...") are absolute paths in disguise
    if path.len() >= 2 && path.as_bytes()[1] == b':' {
        return false;
    }

    for component in path.split(['/', '\\']) {
        if component == ".." || component == "." {
            return false;
        }
    }

    true
}

/// Reduce a server-provided download name to a single safe filename.
///
/// Takes the final path component, so a header smuggling separators cannot
/// escape the destination directory. Returns `None` when nothing usable
/// remains and the caller should use its fallback name.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let candidate = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string();

    if candidate.is_empty()
        || candidate == "."
        || candidate == ".."
        || candidate.chars().any(|c| c.is_ascii_control())
    {
        return None;
    }

    Some(candidate)
}
