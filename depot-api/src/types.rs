//! Request and response bodies for the Depot REST API
//!
//! Field names follow the server verbatim, including its camelCase
//! `lastModified` and the singular `path` key that carries a list on
//! delete requests. Multi-status (207) bodies keep per-item failures
//! separate from the succeeded set; nothing here collapses them.

use serde::{Deserialize, Serialize};

/// One file in a directory listing or search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the volume root, forward slashes
    pub path: String,
    pub size: u64,
    /// Unix seconds of the last modification
    #[serde(rename = "lastModified")]
    pub last_modified: i64,
}

/// One segment of the breadcrumb trail, root first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbEntry {
    pub name: String,
    pub path: String,
}

/// Body of `GET /api/list` and `GET /api/search`.
///
/// For listings `directories` holds bare names; for search results it holds
/// volume-relative paths. The server sorts both before responding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub breadcrumb: Vec<BreadcrumbEntry>,
}

/// `{message}` acknowledgment returned by upload and create endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `{error}` body sent with 4xx/5xx responses.
///
/// The server sometimes attaches a secondary `message` with exception detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Extract the server's error text from a response body, if it has the
/// `{error}` shape. Returns `None` for anything else so callers can fall
/// back to a generic message.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.error)
}

/// One failed item in a 207 multi-status response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub path: String,
    pub error: String,
}

/// Body of `POST /api/move_items`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveItemsRequest {
    pub source_paths: Vec<String>,
    pub destination_path: String,
}

/// Response to a move: 200 with empty `errors`, 207 with both sets populated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveItemsResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub moved: Vec<String>,
    #[serde(default)]
    pub errors: Vec<ItemFailure>,
}

/// Body of `POST /delete`. The server reads the list from the `path` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub path: Vec<String>,
}

/// Response to a delete: 200 with empty `errors`, 207 with both sets populated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deleted: Vec<String>,
    #[serde(default)]
    pub errors: Vec<ItemFailure>,
}

/// JSON body of `POST /download_selected`.
///
/// The passphrase rides along for parity with the original client; the
/// server ignores it and decryption stays client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSelectedRequest {
    pub selected_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

/// Body of `POST /create_folder`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub path: String,
    pub folder_name: String,
}

/// Body of `POST /create_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileRequest {
    pub path: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_parses_server_shape() {
        // Shape taken from the server's list handler
        let body = r#"{
            "directories": ["Documents", "Photos"],
            "files": [
                {"name": "notes.txt", "size": 412, "lastModified": 1714406400, "path": "notes.txt"}
            ],
            "breadcrumb": [{"name": "Root", "path": ""}]
        }"#;

        let listing: DirectoryListing = serde_json::from_str(body).expect("parse listing");
        assert_eq!(listing.directories, vec!["Documents", "Photos"]);
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].name, "notes.txt");
        assert_eq!(listing.files[0].size, 412);
        assert_eq!(listing.files[0].last_modified, 1714406400);
        assert_eq!(listing.breadcrumb[0].name, "Root");
    }

    #[test]
    fn test_listing_missing_fields_default_empty() {
        let listing: DirectoryListing = serde_json::from_str("{}").expect("parse empty");
        assert!(listing.directories.is_empty());
        assert!(listing.files.is_empty());
        assert!(listing.breadcrumb.is_empty());
    }

    #[test]
    fn test_file_entry_serializes_camel_case() {
        let entry = FileEntry {
            name: "a.bin".to_string(),
            path: "dir/a.bin".to_string(),
            size: 9,
            last_modified: 7,
        };
        let json = serde_json::to_string(&entry).expect("serialize");
        assert!(json.contains("\"lastModified\":7"));
        assert!(!json.contains("last_modified"));
    }

    #[test]
    fn test_move_response_full_success() {
        let body = r#"{"message": "All items moved successfully.", "moved": ["a.txt", "b.txt"]}"#;
        let resp: MoveItemsResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(resp.moved.len(), 2);
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn test_move_response_multi_status() {
        // Verbatim 207 shape: two moved, one refused
        let body = r#"{
            "message": "Some items were not moved.",
            "moved": ["a.txt", "b.txt"],
            "errors": [{"path": "c.txt", "error": "Destination already exists."}]
        }"#;
        let resp: MoveItemsResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(resp.moved.len(), 2);
        assert_eq!(resp.errors.len(), 1);
        assert_eq!(resp.errors[0].path, "c.txt");
        assert_eq!(resp.errors[0].error, "Destination already exists.");
    }

    #[test]
    fn test_delete_response_multi_status() {
        let body = r#"{
            "message": "Some items were not deleted.",
            "deleted": ["old.log"],
            "errors": [{"path": "gone.txt", "error": "Item does not exist."}]
        }"#;
        let resp: DeleteResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(resp.deleted, vec!["old.log"]);
        assert_eq!(resp.errors.len(), 1);
    }

    #[test]
    fn test_delete_request_uses_path_key() {
        let req = DeleteRequest {
            path: vec!["x".to_string()],
        };
        let json = serde_json::to_string(&req).expect("serialize");
        assert_eq!(json, r#"{"path":["x"]}"#);
    }

    #[test]
    fn test_download_request_omits_absent_passphrase() {
        let req = DownloadSelectedRequest {
            selected_paths: vec!["report.pdf".to_string()],
            passphrase: None,
        };
        let json = serde_json::to_string(&req).expect("serialize");
        assert!(!json.contains("passphrase"));

        let req = DownloadSelectedRequest {
            selected_paths: vec!["report.pdf".to_string()],
            passphrase: Some("hunter2".to_string()),
        };
        let json = serde_json::to_string(&req).expect("serialize");
        assert!(json.contains("\"passphrase\":\"hunter2\""));
    }

    #[test]
    fn test_error_message_extracts_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Directory not found"}"#),
            Some("Directory not found".to_string())
        );
        assert_eq!(
            error_message(r#"{"error": "boom", "message": "trace"}"#),
            Some("boom".to_string())
        );
    }

    #[test]
    fn test_error_message_rejects_other_shapes() {
        assert_eq!(error_message(r#"{"message": "ok"}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(""), None);
    }
}
