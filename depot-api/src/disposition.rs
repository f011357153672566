//! `Content-Disposition` filename extraction
//!
//! The server names downloads through `Content-Disposition: attachment;
//! filename="..."`. This parser accepts the quoted and unquoted forms the
//! server is known to emit, tolerates an unterminated quote, and returns
//! `None` for anything unusable so callers fall back to a generic name.

/// Extract the download filename from a `Content-Disposition` header value.
///
/// Scans for a `filename`-prefixed parameter (which also covers
/// `filename*=`), takes the first one with a non-empty value, and strips
/// any quoting. Quoted values may contain semicolons; unquoted values end
/// at the next `;`.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    for (idx, _) in header.match_indices("filename") {
        let rest = &header[idx + "filename".len()..];

        // Parameter name may continue (e.g. `filename*`) but never across
        // a separator; skip this occurrence if one appears before `=`.
        let Some(eq) = rest.find('=') else { continue };
        if rest[..eq].contains(';') || rest[..eq].contains('\n') {
            continue;
        }

        let raw = &rest[eq + 1..];
        let value = match raw.chars().next() {
            Some(quote @ ('"' | '\'')) => match raw[1..].find(quote) {
                Some(end) => &raw[1..1 + end],
                // Unterminated quote: take up to the next separator
                None => raw.split([';', '\n']).next().unwrap_or(""),
            },
            _ => raw.split([';', '\n']).next().unwrap_or(""),
        };

        let name: String = value.chars().filter(|c| *c != '"' && *c != '\'').collect();
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    None
}
