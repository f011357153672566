//! Transfer types for upload and download tracking
//!
//! These types describe a single transfer from creation through its terminal
//! state. Records are plain data; liveness (cancel flags, event channels)
//! lives in the registry and executor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use depot_api::types::ItemFailure;

// =============================================================================
// Transfer Kind
// =============================================================================

/// Direction of the transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// Uploading local data to the server
    Upload,
    /// Downloading from the server to a local file
    Download,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::Upload => write!(f, "upload"),
            TransferKind::Download => write!(f, "download"),
        }
    }
}

// =============================================================================
// Transfer Status
// =============================================================================

/// Current status of a transfer
///
/// The only legal moves are Pending -> Active and either of those into one
/// of the three terminal states. Terminal states are absorbing; the registry
/// discards any event that would leave one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Created but the request has not been sent yet
    Pending,
    /// Request in flight, bytes moving
    Active,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Canceled by the user
    Canceled,
}

impl TransferStatus {
    /// Returns true once the transfer can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Canceled
        )
    }

    /// Returns true if the transfer completed successfully
    pub fn is_completed(&self) -> bool {
        matches!(self, TransferStatus::Completed)
    }

    /// Returns true if the transfer failed
    pub fn is_failed(&self) -> bool {
        matches!(self, TransferStatus::Failed)
    }

    /// Returns true if the transfer was canceled
    pub fn is_canceled(&self) -> bool {
        matches!(self, TransferStatus::Canceled)
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Active => "active",
            TransferStatus::Completed => "completed",
            TransferStatus::Failed => "failed",
            TransferStatus::Canceled => "canceled",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Batch Outcome
// =============================================================================

/// Result of a batch operation (delete, move) over several items
///
/// The server processes items independently, so one request can succeed for
/// some paths and fail for others. Both lists are kept; callers decide how
/// to present them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Paths the server processed successfully
    pub succeeded: Vec<String>,
    /// Items that failed, each with its own reason
    pub failed: Vec<ItemFailure>,
}

impl BatchOutcome {
    /// Total number of items the request covered
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Returns true when some items succeeded and some failed
    pub fn is_partial(&self) -> bool {
        !self.succeeded.is_empty() && !self.failed.is_empty()
    }
}

// =============================================================================
// Transfer Error
// =============================================================================

/// Why a transfer or batch operation failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferError {
    /// Transport failure before or during the exchange
    Network(String),
    /// The server replied with an error status or an error body
    Server { status: u16, message: String },
    /// Batch operation where some items failed; carries both lists
    Partial(BatchOutcome),
    /// Cipher failure; in practice a wrong passphrase at decrypt time
    Decryption,
    /// The transfer was canceled before it finished
    Canceled,
    /// Local file I/O failed while writing a download
    Io(String),
    /// Rejected locally before anything was sent
    InvalidRequest(String),
}

impl TransferError {
    /// Returns true if this error came from a user cancel
    pub fn is_canceled(&self) -> bool {
        matches!(self, TransferError::Canceled)
    }
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferError::Network(message) => write!(f, "network error: {message}"),
            TransferError::Server { status, message } => {
                write!(f, "server error ({status}): {message}")
            }
            TransferError::Partial(outcome) => {
                write!(
                    f,
                    "{} of {} items failed",
                    outcome.failed.len(),
                    outcome.total()
                )
            }
            TransferError::Decryption => write!(f, "incorrect passphrase or decryption failed"),
            TransferError::Canceled => write!(f, "transfer canceled"),
            TransferError::Io(message) => write!(f, "file error: {message}"),
            TransferError::InvalidRequest(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl std::error::Error for TransferError {}

impl From<reqwest::Error> for TransferError {
    fn from(err: reqwest::Error) -> Self {
        TransferError::Network(err.to_string())
    }
}

// =============================================================================
// Transfer Inputs
// =============================================================================

/// A file queued for upload, already read into memory
///
/// For folder uploads the name keeps its relative path ("dir/sub/file.txt")
/// so the server can recreate the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// Filename or slash-separated relative path
    pub name: String,
    /// File contents
    pub contents: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }
}

/// A server-side item selected for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Path relative to the volume root
    pub path: String,
    /// Directories always download as part of an archive
    pub is_directory: bool,
}

impl RemoteItem {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_directory: true,
        }
    }
}

// =============================================================================
// Transfer
// =============================================================================

/// A single tracked transfer
///
/// One record per progress bar: a single-file upload, one file of a multi-file
/// upload batch, a folder upload, or a download (single file or server-built
/// archive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique identifier for this transfer
    pub id: Uuid,

    /// Direction of transfer
    pub kind: TransferKind,

    /// Name shown in transfer lists
    pub display_name: String,

    /// Remote destination directory (uploads) or selected paths (downloads)
    pub remote_paths: Vec<String>,

    /// Where the payload landed locally; set when a download completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,

    /// Total size in bytes, None until the transport reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,

    /// Bytes moved so far; never decreases
    pub transferred_bytes: u64,

    /// Current status
    pub status: TransferStatus,

    /// Whether the payload is encrypted with a passphrase
    #[serde(default)]
    pub encrypted: bool,

    /// Error message if status is Failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error kind if status is Failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<TransferError>,

    /// Timestamp when the transfer was created
    pub created_at: i64,

    /// Timestamp when the request went out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,

    /// Timestamp when the transfer reached a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl Transfer {
    /// Create a new upload transfer
    ///
    /// The total is None for encrypted uploads, where the wire size is only
    /// known once the payload has been sealed.
    pub fn new_upload(
        display_name: String,
        remote_dir: String,
        total_bytes: Option<u64>,
        encrypted: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TransferKind::Upload,
            display_name,
            remote_paths: vec![remote_dir],
            local_path: None,
            total_bytes,
            transferred_bytes: 0,
            status: TransferStatus::Pending,
            encrypted,
            error: None,
            error_kind: None,
            created_at: chrono::Utc::now().timestamp(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Create a new download transfer; the size is unknown until the
    /// response arrives
    pub fn new_download(
        display_name: String,
        selected_paths: Vec<String>,
        encrypted: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TransferKind::Download,
            display_name,
            remote_paths: selected_paths,
            local_path: None,
            total_bytes: None,
            transferred_bytes: 0,
            status: TransferStatus::Pending,
            encrypted,
            error: None,
            error_kind: None,
            created_at: chrono::Utc::now().timestamp(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Calculate progress as a percentage (0.0 to 100.0)
    ///
    /// Returns None while the total is still unknown; callers show an
    /// indeterminate bar in that case.
    pub fn progress_percent(&self) -> Option<f32> {
        if self.status.is_completed() {
            return Some(100.0);
        }
        match self.total_bytes {
            Some(0) => Some(0.0),
            Some(total) => Some((self.transferred_bytes as f64 / total as f64 * 100.0) as f32),
            None => None,
        }
    }

    /// Mark the transfer as started
    pub fn start(&mut self, total_bytes: Option<u64>) {
        self.status = TransferStatus::Active;
        self.started_at = Some(chrono::Utc::now().timestamp());
        if total_bytes.is_some() {
            self.total_bytes = total_bytes;
        }
    }

    /// Fold a progress report into the record
    ///
    /// The byte counter only moves forward, and never past a known total.
    /// The total is adopted from the first report that carries one.
    pub fn advance(&mut self, transferred_bytes: u64, total_bytes: Option<u64>) {
        if self.total_bytes.is_none() {
            self.total_bytes = total_bytes;
        }
        let mut next = self.transferred_bytes.max(transferred_bytes);
        if let Some(total) = self.total_bytes {
            next = next.min(total);
        }
        self.transferred_bytes = next;
    }

    /// Mark the transfer as completed
    pub fn complete(&mut self, local_path: Option<PathBuf>) {
        self.status = TransferStatus::Completed;
        if let Some(total) = self.total_bytes {
            self.transferred_bytes = total;
        }
        if local_path.is_some() {
            self.local_path = local_path;
        }
        self.error = None;
        self.error_kind = None;
        self.completed_at = Some(chrono::Utc::now().timestamp());
    }

    /// Mark the transfer as failed with an error
    pub fn fail(&mut self, error: TransferError) {
        self.status = TransferStatus::Failed;
        self.error = Some(error.to_string());
        self.error_kind = Some(error);
        self.completed_at = Some(chrono::Utc::now().timestamp());
    }

    /// Mark the transfer as canceled
    pub fn cancel(&mut self) {
        self.status = TransferStatus::Canceled;
        self.completed_at = Some(chrono::Utc::now().timestamp());
    }

    /// Calculate elapsed time in seconds (from start to now or completion)
    pub fn elapsed_seconds(&self) -> Option<i64> {
        let start = self.started_at?;
        let end = self
            .completed_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        Some(end - start)
    }

    /// Calculate transfer speed in bytes per second
    pub fn bytes_per_second(&self) -> Option<f64> {
        let elapsed = self.elapsed_seconds()?;
        if elapsed > 0 {
            Some(self.transferred_bytes as f64 / elapsed as f64)
        } else {
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_upload() {
        let transfer = Transfer::new_upload(
            "report.pdf".to_string(),
            "documents".to_string(),
            Some(2048),
            false,
        );

        assert_eq!(transfer.kind, TransferKind::Upload);
        assert_eq!(transfer.display_name, "report.pdf");
        assert_eq!(transfer.remote_paths, vec!["documents".to_string()]);
        assert_eq!(transfer.total_bytes, Some(2048));
        assert_eq!(transfer.transferred_bytes, 0);
        assert_eq!(transfer.status, TransferStatus::Pending);
        assert!(!transfer.encrypted);
        assert!(transfer.created_at > 0);
    }

    #[test]
    fn test_new_download_has_no_total() {
        let transfer = Transfer::new_download(
            "app.zip".to_string(),
            vec!["builds/app.zip".to_string()],
            true,
        );

        assert_eq!(transfer.kind, TransferKind::Download);
        assert!(transfer.total_bytes.is_none());
        assert!(transfer.encrypted);
        assert!(transfer.local_path.is_none());
    }

    #[test]
    fn test_progress_percent() {
        let mut transfer =
            Transfer::new_upload("a.bin".to_string(), String::new(), Some(1000), false);

        assert_eq!(transfer.progress_percent(), Some(0.0));

        transfer.transferred_bytes = 250;
        assert!((transfer.progress_percent().unwrap() - 25.0).abs() < 0.01);

        transfer.transferred_bytes = 1000;
        assert!((transfer.progress_percent().unwrap() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_progress_percent_indeterminate_until_total_known() {
        let mut transfer =
            Transfer::new_download("a.bin".to_string(), vec!["a.bin".to_string()], false);

        // No total yet
        assert!(transfer.progress_percent().is_none());

        transfer.advance(100, Some(400));
        assert!((transfer.progress_percent().unwrap() - 25.0).abs() < 0.01);

        // Completed reports 100 even if a total never arrived
        let mut other =
            Transfer::new_download("b.bin".to_string(), vec!["b.bin".to_string()], false);
        other.complete(None);
        assert_eq!(other.progress_percent(), Some(100.0));
    }

    #[test]
    fn test_zero_byte_upload_progress() {
        let mut transfer =
            Transfer::new_upload("empty".to_string(), String::new(), Some(0), false);
        assert_eq!(transfer.progress_percent(), Some(0.0));
        transfer.complete(None);
        assert_eq!(transfer.progress_percent(), Some(100.0));
    }

    #[test]
    fn test_advance_never_decreases() {
        let mut transfer =
            Transfer::new_download("a.bin".to_string(), vec!["a.bin".to_string()], false);

        transfer.advance(500, Some(1000));
        assert_eq!(transfer.transferred_bytes, 500);

        // A stale report with a smaller count is ignored
        transfer.advance(200, None);
        assert_eq!(transfer.transferred_bytes, 500);

        transfer.advance(800, None);
        assert_eq!(transfer.transferred_bytes, 800);
    }

    #[test]
    fn test_advance_clamps_to_total() {
        let mut transfer =
            Transfer::new_upload("a.bin".to_string(), String::new(), Some(1000), false);
        transfer.advance(1500, None);
        assert_eq!(transfer.transferred_bytes, 1000);
    }

    #[test]
    fn test_advance_adopts_first_total_only() {
        let mut transfer =
            Transfer::new_download("a.bin".to_string(), vec!["a.bin".to_string()], false);

        transfer.advance(10, Some(100));
        assert_eq!(transfer.total_bytes, Some(100));

        // Later totals do not replace the first
        transfer.advance(20, Some(999));
        assert_eq!(transfer.total_bytes, Some(100));
    }

    #[test]
    fn test_start_sets_total_and_timestamp() {
        let mut transfer =
            Transfer::new_download("a.bin".to_string(), vec!["a.bin".to_string()], false);
        assert!(transfer.started_at.is_none());

        transfer.start(Some(4096));
        assert_eq!(transfer.status, TransferStatus::Active);
        assert_eq!(transfer.total_bytes, Some(4096));
        assert!(transfer.started_at.is_some());
    }

    #[test]
    fn test_complete_fills_counter_and_clears_error() {
        let mut transfer =
            Transfer::new_upload("a.bin".to_string(), String::new(), Some(1000), false);
        transfer.start(None);
        transfer.transferred_bytes = 700;
        transfer.error = Some("stale".to_string());

        transfer.complete(Some(PathBuf::from("/tmp/a.bin")));
        assert_eq!(transfer.status, TransferStatus::Completed);
        assert_eq!(transfer.transferred_bytes, 1000);
        assert_eq!(transfer.local_path, Some(PathBuf::from("/tmp/a.bin")));
        assert!(transfer.error.is_none());
        assert!(transfer.completed_at.is_some());
    }

    #[test]
    fn test_fail_records_error_and_kind() {
        let mut transfer =
            Transfer::new_upload("a.bin".to_string(), String::new(), Some(1000), false);
        transfer.start(None);
        transfer.fail(TransferError::Server {
            status: 500,
            message: "disk full".to_string(),
        });

        assert_eq!(transfer.status, TransferStatus::Failed);
        assert_eq!(transfer.error, Some("server error (500): disk full".to_string()));
        assert!(matches!(
            transfer.error_kind,
            Some(TransferError::Server { status: 500, .. })
        ));
        assert!(transfer.completed_at.is_some());
    }

    #[test]
    fn test_cancel_sets_terminal_state() {
        let mut transfer =
            Transfer::new_download("a.bin".to_string(), vec!["a.bin".to_string()], false);
        transfer.cancel();
        assert_eq!(transfer.status, TransferStatus::Canceled);
        assert!(transfer.status.is_terminal());
        assert!(transfer.completed_at.is_some());
    }

    #[test]
    fn test_status_predicates() {
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Active.is_terminal());
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(TransferStatus::Canceled.is_terminal());

        assert!(TransferStatus::Completed.is_completed());
        assert!(!TransferStatus::Failed.is_completed());
        assert!(TransferStatus::Failed.is_failed());
        assert!(TransferStatus::Canceled.is_canceled());
    }

    #[test]
    fn test_error_display() {
        let network = TransferError::Network("connection refused".to_string());
        assert_eq!(network.to_string(), "network error: connection refused");

        let server = TransferError::Server {
            status: 403,
            message: "CSRF token missing".to_string(),
        };
        assert_eq!(server.to_string(), "server error (403): CSRF token missing");

        assert_eq!(
            TransferError::Decryption.to_string(),
            "incorrect passphrase or decryption failed"
        );
        assert_eq!(TransferError::Canceled.to_string(), "transfer canceled");
        assert!(TransferError::Canceled.is_canceled());
    }

    #[test]
    fn test_partial_error_display() {
        let outcome = BatchOutcome {
            succeeded: vec!["a.txt".to_string(), "b.txt".to_string()],
            failed: vec![ItemFailure {
                path: "c.txt".to_string(),
                error: "File not found".to_string(),
            }],
        };
        assert!(outcome.is_partial());
        assert_eq!(outcome.total(), 3);

        let error = TransferError::Partial(outcome);
        assert_eq!(error.to_string(), "1 of 3 items failed");
    }

    #[test]
    fn test_batch_outcome_all_failed_is_not_partial() {
        let outcome = BatchOutcome {
            succeeded: vec![],
            failed: vec![ItemFailure {
                path: "a.txt".to_string(),
                error: "denied".to_string(),
            }],
        };
        assert!(!outcome.is_partial());
    }

    #[test]
    fn test_transfer_serialization_roundtrip() {
        let mut transfer = Transfer::new_download(
            "photos.zip".to_string(),
            vec!["photos".to_string(), "notes.txt".to_string()],
            false,
        );
        transfer.fail(TransferError::Network("timed out".to_string()));

        let json = serde_json::to_string(&transfer).expect("serialize");
        let deserialized: Transfer = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(deserialized.id, transfer.id);
        assert_eq!(deserialized.kind, TransferKind::Download);
        assert_eq!(deserialized.status, TransferStatus::Failed);
        assert_eq!(deserialized.remote_paths, transfer.remote_paths);
        assert_eq!(
            deserialized.error_kind,
            Some(TransferError::Network("timed out".to_string()))
        );
    }

    #[test]
    fn test_elapsed_and_speed() {
        let mut transfer =
            Transfer::new_upload("a.bin".to_string(), String::new(), Some(10000), false);
        assert!(transfer.elapsed_seconds().is_none());

        transfer.started_at = Some(1000);
        transfer.completed_at = Some(1010);
        transfer.transferred_bytes = 10000;

        assert_eq!(transfer.elapsed_seconds(), Some(10));
        let speed = transfer.bytes_per_second().unwrap();
        assert!((speed - 1000.0).abs() < 0.01);
    }
}
