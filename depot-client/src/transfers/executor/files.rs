//! Local file helpers for the transfer executor

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use crate::transfers::types::TransferError;

/// Check if the transfer has been cancelled
pub(super) fn is_cancelled(cancel_flag: &Arc<AtomicBool>) -> bool {
    cancel_flag.load(Ordering::SeqCst)
}

/// Pick a destination that does not collide with an existing file.
///
/// Given "/downloads/report.pdf" with a file already there, tries
/// "report (1).pdf", "report (2).pdf", and so on. If a thousand numbered
/// names are somehow all taken, falls back to a random suffix rather than
/// failing the download.
pub(super) async fn generate_unique_path(desired: &Path) -> PathBuf {
    if tokio::fs::metadata(desired).await.is_err() {
        return desired.to_path_buf();
    }

    let stem = desired
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let extension = desired.extension().and_then(|s| s.to_str());
    let parent = desired.parent().unwrap_or_else(|| Path::new(""));

    for i in 1..1000 {
        let candidate = parent.join(numbered_name(stem, &i.to_string(), extension));
        if tokio::fs::metadata(&candidate).await.is_err() {
            return candidate;
        }
    }

    parent.join(numbered_name(stem, &Uuid::new_v4().to_string(), extension))
}

fn numbered_name(stem: &str, suffix: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{stem} ({suffix}).{ext}"),
        None => format!("{stem} ({suffix})"),
    }
}

/// Write a buffer to `dest`, creating parent directories as needed
pub(super) async fn write_file(dest: &Path, contents: &[u8]) -> Result<(), TransferError> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;
    }
    tokio::fs::write(dest, contents)
        .await
        .map_err(|e| TransferError::Io(e.to_string()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_generate_unique_path_free_path_unchanged() {
        let dir = TempDir::new().expect("temp dir");
        let desired = dir.path().join("report.pdf");
        assert_eq!(generate_unique_path(&desired).await, desired);
    }

    #[tokio::test]
    async fn test_generate_unique_path_numbers_collisions() {
        let dir = TempDir::new().expect("temp dir");
        let desired = dir.path().join("report.pdf");
        tokio::fs::write(&desired, b"first").await.expect("write");

        let second = generate_unique_path(&desired).await;
        assert_eq!(second, dir.path().join("report (1).pdf"));

        tokio::fs::write(&second, b"second").await.expect("write");
        let third = generate_unique_path(&desired).await;
        assert_eq!(third, dir.path().join("report (2).pdf"));
    }

    #[tokio::test]
    async fn test_generate_unique_path_without_extension() {
        let dir = TempDir::new().expect("temp dir");
        let desired = dir.path().join("Makefile");
        tokio::fs::write(&desired, b"x").await.expect("write");

        let renamed = generate_unique_path(&desired).await;
        assert_eq!(renamed, dir.path().join("Makefile (1)"));
    }

    #[tokio::test]
    async fn test_write_file_creates_parent_dirs() {
        let dir = TempDir::new().expect("temp dir");
        let dest = dir.path().join("nested/deeper/out.bin");
        write_file(&dest, b"\x00\x01\x02").await.expect("write");

        let read_back = tokio::fs::read(&dest).await.expect("read");
        assert_eq!(read_back, b"\x00\x01\x02");
    }

    #[test]
    fn test_is_cancelled_reads_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(!is_cancelled(&flag));
        flag.store(true, Ordering::SeqCst);
        assert!(is_cancelled(&flag));
    }
}
