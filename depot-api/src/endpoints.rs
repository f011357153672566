//! Endpoint paths for the Depot REST API
//!
//! The server mounts browsing endpoints under `/api` and the mutating
//! file-management endpoints at the root. These constants are the single
//! source of truth for both; the client joins them onto its configured
//! base URL with [`join`].

/// Directory listing: `GET /api/list?path=<p>`
pub const LIST: &str = "/api/list";

/// Global filename search: `GET /api/search?query=<q>`
pub const SEARCH: &str = "/api/search";

/// Multipart file upload: `POST /upload`
pub const UPLOAD: &str = "/upload";

/// Selected-items download (single file or zip): `POST /download_selected`
pub const DOWNLOAD_SELECTED: &str = "/download_selected";

/// Whole-volume archive download: `GET /download_all`
pub const DOWNLOAD_ALL: &str = "/download_all";

/// Batch delete: `POST /delete`
pub const DELETE: &str = "/delete";

/// Batch move: `POST /api/move_items`
pub const MOVE_ITEMS: &str = "/api/move_items";

/// Folder creation: `POST /create_folder`
pub const CREATE_FOLDER: &str = "/create_folder";

/// Empty-file creation: `POST /create_file`
pub const CREATE_FILE: &str = "/create_file";

/// Join an endpoint path onto a base URL.
///
/// Tolerates a trailing slash on the base so `http://host/` and
/// `http://host` produce the same request URL.
pub fn join(base_url: &str, endpoint: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_plain_base() {
        assert_eq!(
            join("http://localhost:5000", LIST),
            "http://localhost:5000/api/list"
        );
    }

    #[test]
    fn test_join_trailing_slash() {
        assert_eq!(
            join("http://localhost:5000/", UPLOAD),
            "http://localhost:5000/upload"
        );
        assert_eq!(
            join("https://depot.example.com//", DOWNLOAD_ALL),
            "https://depot.example.com/download_all"
        );
    }

    #[test]
    fn test_all_endpoints_rooted() {
        // Every endpoint must start with a slash so join produces valid URLs
        for endpoint in [
            LIST,
            SEARCH,
            UPLOAD,
            DOWNLOAD_SELECTED,
            DOWNLOAD_ALL,
            DELETE,
            MOVE_ITEMS,
            CREATE_FOLDER,
            CREATE_FILE,
        ] {
            assert!(endpoint.starts_with('/'), "not rooted: {}", endpoint);
        }
    }
}
