//! Streaming bodies for the transfer executor
//!
//! Upload bodies are chunked streams that count outbound bytes and fail
//! fast on cancel; download responses are consumed chunk by chunk with
//! throttled progress events.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use futures_util::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::transfers::types::TransferError;

use super::files::is_cancelled;
use super::{BUFFER_SIZE, PROGRESS_UPDATE_INTERVAL, TransferEvent};

/// Chunked request body for one file part.
///
/// Outbound bytes are added to the shared `sent` counter as chunks are
/// pulled; once the cancel flag flips, the stream yields an error so the
/// transport tears the request down instead of finishing the send.
pub(super) fn upload_body(
    contents: Vec<u8>,
    sent: Arc<AtomicU64>,
    cancel_flag: Arc<AtomicBool>,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + 'static {
    futures_util::stream::unfold(
        (contents, 0usize, sent, cancel_flag),
        |(contents, offset, sent, cancel_flag)| async move {
            if offset >= contents.len() {
                return None;
            }
            if cancel_flag.load(Ordering::SeqCst) {
                let end = contents.len();
                return Some((
                    Err(std::io::Error::other("transfer canceled")),
                    (contents, end, sent, cancel_flag),
                ));
            }
            let end = (offset + BUFFER_SIZE).min(contents.len());
            let chunk = contents[offset..end].to_vec();
            sent.fetch_add((end - offset) as u64, Ordering::SeqCst);
            Some((Ok(chunk), (contents, end, sent, cancel_flag)))
        },
    )
}

/// Stream a response body to `dest`, emitting throttled progress and
/// checking the cancel flag between chunks.
///
/// The total comes from Content-Length when the server sends one; progress
/// stays indeterminate otherwise. A final unthrottled event always fires so
/// the last reported count matches what is on disk.
pub(super) async fn stream_body_to_file(
    response: reqwest::Response,
    dest: &Path,
    id: Uuid,
    events: &mpsc::UnboundedSender<TransferEvent>,
    cancel_flag: &Arc<AtomicBool>,
) -> Result<(), TransferError> {
    let total_bytes = response.content_length();
    let mut file = File::create(dest)
        .await
        .map_err(|e| TransferError::Io(e.to_string()))?;

    let mut stream = response.bytes_stream();
    let mut transferred: u64 = 0;
    let mut last_progress = Instant::now();

    while let Some(chunk) = stream.next().await {
        if is_cancelled(cancel_flag) {
            return Err(TransferError::Canceled);
        }
        let chunk = chunk.map_err(|e| TransferError::Network(e.to_string()))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;
        transferred += chunk.len() as u64;

        if last_progress.elapsed() >= PROGRESS_UPDATE_INTERVAL {
            let _ = events.send(TransferEvent::Progress {
                id,
                transferred_bytes: transferred,
                total_bytes,
            });
            last_progress = Instant::now();
        }
    }

    file.flush()
        .await
        .map_err(|e| TransferError::Io(e.to_string()))?;

    let _ = events.send(TransferEvent::Progress {
        id,
        transferred_bytes: transferred,
        total_bytes,
    });
    Ok(())
}

/// Buffer a response body in memory with the same progress and cancel
/// behavior as the file path.
///
/// Used when the payload is an envelope, which must be complete before it
/// can be opened.
pub(super) async fn read_body_to_memory(
    response: reqwest::Response,
    id: Uuid,
    events: &mpsc::UnboundedSender<TransferEvent>,
    cancel_flag: &Arc<AtomicBool>,
) -> Result<Vec<u8>, TransferError> {
    let total_bytes = response.content_length();
    let mut buffered: Vec<u8> = Vec::new();
    let mut stream = response.bytes_stream();
    let mut last_progress = Instant::now();

    while let Some(chunk) = stream.next().await {
        if is_cancelled(cancel_flag) {
            return Err(TransferError::Canceled);
        }
        let chunk = chunk.map_err(|e| TransferError::Network(e.to_string()))?;
        buffered.extend_from_slice(&chunk);

        if last_progress.elapsed() >= PROGRESS_UPDATE_INTERVAL {
            let _ = events.send(TransferEvent::Progress {
                id,
                transferred_bytes: buffered.len() as u64,
                total_bytes,
            });
            last_progress = Instant::now();
        }
    }

    let _ = events.send(TransferEvent::Progress {
        id,
        transferred_bytes: buffered.len() as u64,
        total_bytes,
    });
    Ok(buffered)
}

// =============================================================================
// Tests
// =============================================================================
