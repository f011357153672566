//! Depot API wire contract
//!
//! Shared request/response types, endpoint paths, and header parsing for the
//! Depot file-storage REST API. Everything in this crate is pure and
//! synchronous: no I/O, no async, no HTTP client. The `depot-client` crate
//! layers the actual transport on top.

pub mod disposition;
pub mod endpoints;
pub mod paths;
pub mod types;

pub use disposition::parse_content_disposition;
pub use paths::{is_safe_relative_path, sanitize_filename};
pub use types::{
    BreadcrumbEntry, CreateFileRequest, CreateFolderRequest, DeleteRequest, DeleteResponse,
    DirectoryListing, DownloadSelectedRequest, ErrorResponse, FileEntry, ItemFailure,
    MessageResponse, MoveItemsRequest, MoveItemsResponse, error_message,
};

/// Request header carrying the CSRF token on programmatic calls
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Form field carrying the CSRF token on the form-encoded download path
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Fallback name for a single-file download when the server names nothing
pub const SINGLE_FILE_FALLBACK_NAME: &str = "downloaded_file";

/// Fallback name for an archive download when the server names nothing
pub const ARCHIVE_FALLBACK_NAME: &str = "download.zip";

/// Multi-status: some items in a batch succeeded, others failed independently
pub const STATUS_MULTI_STATUS: u16 = 207;
