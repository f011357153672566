//! Transfer executor - drives one transfer over HTTP to a terminal state
//!
//! Each enqueued transfer runs `execute_transfer` in its own task. The
//! executor streams bytes in the relevant direction, reports progress over
//! an event channel, and checks a cancel flag between chunks. It never
//! touches the registry; the coordinator's event pump folds the emitted
//! events into records.
//!
//! ## Module Structure
//!
//! - `streaming` - progress-reporting upload bodies and response streaming
//! - `form` - buffered form-encoded download for degraded platforms
//! - `files` - local destination helpers

mod files;
mod form;
mod streaming;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use depot_api::disposition::parse_content_disposition;
use depot_api::paths::sanitize_filename;
use depot_api::types::{DownloadSelectedRequest, MessageResponse, error_message};
use depot_api::{ARCHIVE_FALLBACK_NAME, SINGLE_FILE_FALLBACK_NAME, endpoints};

use crate::api::{ApiClient, error_from_response};
use crate::crypto::EncryptionEnvelope;

use super::types::{Transfer, TransferError, UploadFile};

use files::{generate_unique_path, is_cancelled, write_file};
use streaming::{read_body_to_memory, stream_body_to_file, upload_body};

// =============================================================================
// Constants
// =============================================================================

/// Chunk size for streamed bodies in both directions
pub(crate) const BUFFER_SIZE: usize = 64 * 1024; // 64KB

/// Minimum interval between progress events (100ms = 10 updates/second)
pub(crate) const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// Progress Events
// =============================================================================

/// Lifecycle event sent from the executor to the coordinator's pump
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// The request went out
    Started { id: Uuid, total_bytes: Option<u64> },

    /// Periodic byte count update; the total rides along so indeterminate
    /// transfers pick one up from the first report that knows it
    Progress {
        id: Uuid,
        transferred_bytes: u64,
        total_bytes: Option<u64>,
    },

    /// Transfer finished; downloads carry the final on-disk path
    Completed {
        id: Uuid,
        local_path: Option<PathBuf>,
    },

    /// Transfer failed
    Failed { id: Uuid, error: TransferError },

    /// The executor observed the cancel flag and stopped
    Canceled { id: Uuid },
}

impl TransferEvent {
    /// The transfer this event belongs to
    pub fn id(&self) -> Uuid {
        match self {
            TransferEvent::Started { id, .. }
            | TransferEvent::Progress { id, .. }
            | TransferEvent::Completed { id, .. }
            | TransferEvent::Failed { id, .. }
            | TransferEvent::Canceled { id } => *id,
        }
    }
}

// =============================================================================
// Jobs
// =============================================================================

/// How a download body is fetched on this platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStrategy {
    /// Streamed chunk by chunk with progress events and cancellation
    Streamed,
    /// One-shot form POST; no progress, no cancel
    FormEncoded,
}

/// What a download asks the server for
#[derive(Debug, Clone)]
pub enum DownloadSource {
    /// Named paths via the selection endpoint
    Selection(Vec<String>),
    /// Every file on the volume as one archive
    EntireVolume,
}

/// A download about to execute
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub source: DownloadSource,
    /// Directory the finished file lands in
    pub dest_dir: PathBuf,
    /// Present when the payload must be decrypted after download
    pub passphrase: Option<String>,
    /// Single named files may be envelopes; archives never are
    pub single_file: bool,
    pub strategy: DownloadStrategy,
}

/// An upload about to execute
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub files: Vec<UploadFile>,
    /// Remote directory the files land in
    pub remote_dir: String,
    /// Present when payloads must be sealed before sending
    pub passphrase: Option<String>,
}

/// The work behind one transfer record
#[derive(Debug, Clone)]
pub enum TransferJob {
    Upload(UploadJob),
    Download(DownloadJob),
}

// =============================================================================
// Error Helpers
// =============================================================================

/// Send a Failed event and hand the error back for returning
fn send_failed_event(
    events: &mpsc::UnboundedSender<TransferEvent>,
    id: Uuid,
    error: TransferError,
) -> TransferError {
    let _ = events.send(TransferEvent::Failed {
        id,
        error: error.clone(),
    });
    error
}

/// Send a Canceled event and hand back the matching error
fn send_canceled_event(
    events: &mpsc::UnboundedSender<TransferEvent>,
    id: Uuid,
) -> TransferError {
    let _ = events.send(TransferEvent::Canceled { id });
    TransferError::Canceled
}

// =============================================================================
// Executor
// =============================================================================

/// Execute a single transfer to a terminal state.
///
/// Emits Started, throttled Progress, and exactly one terminal event for
/// `transfer.id` on `events`; the returned Result mirrors the terminal
/// event. The cancel flag is checked between chunks and at every phase
/// boundary; once it is observed no further events are sent for this id.
pub async fn execute_transfer(
    api: &ApiClient,
    transfer: &Transfer,
    job: TransferJob,
    events: &mpsc::UnboundedSender<TransferEvent>,
    cancel_flag: &Arc<AtomicBool>,
) -> Result<(), TransferError> {
    let id = transfer.id;

    if is_cancelled(cancel_flag) {
        return Err(send_canceled_event(events, id));
    }

    let result = match job {
        TransferJob::Upload(upload) => run_upload(api, id, upload, events, cancel_flag).await,
        TransferJob::Download(download) => {
            run_download(api, id, download, events, cancel_flag).await
        }
    };

    match &result {
        Ok(()) => debug!(%id, "transfer completed"),
        Err(TransferError::Canceled) => debug!(%id, "transfer canceled"),
        Err(error) => debug!(%id, "transfer failed: {error}"),
    }
    result
}

// =============================================================================
// Upload
// =============================================================================

/// Upload one or more files as a single multipart request.
///
/// Payloads are sealed first when a passphrase is present, so the reported
/// total reflects what actually goes over the wire. All file parts share one
/// outbound byte counter; progress events aggregate across the batch.
async fn run_upload(
    api: &ApiClient,
    id: Uuid,
    job: UploadJob,
    events: &mpsc::UnboundedSender<TransferEvent>,
    cancel_flag: &Arc<AtomicBool>,
) -> Result<(), TransferError> {
    let mut prepared: Vec<UploadFile> = Vec::with_capacity(job.files.len());
    for file in job.files {
        if is_cancelled(cancel_flag) {
            return Err(send_canceled_event(events, id));
        }
        let contents = match &job.passphrase {
            Some(passphrase) => {
                let envelope = EncryptionEnvelope::seal(&file.contents, passphrase)
                    .map_err(|_| send_failed_event(events, id, TransferError::Decryption))?;
                envelope.encode().into_bytes()
            }
            None => file.contents,
        };
        prepared.push(UploadFile::new(file.name, contents));
    }

    let total_bytes: u64 = prepared.iter().map(|f| f.contents.len() as u64).sum();
    let sent = Arc::new(AtomicU64::new(0));

    let mut parts = reqwest::multipart::Form::new().text("path", job.remote_dir.clone());
    if let Some(passphrase) = &job.passphrase {
        parts = parts.text("passphrase", passphrase.clone());
    }
    for file in prepared {
        let length = file.contents.len() as u64;
        let body = reqwest::Body::wrap_stream(upload_body(
            file.contents,
            Arc::clone(&sent),
            Arc::clone(cancel_flag),
        ));
        let part = reqwest::multipart::Part::stream_with_length(body, length)
            .file_name(file.name)
            .mime_str("application/octet-stream")
            .map_err(|e| {
                send_failed_event(events, id, TransferError::Network(e.to_string()))
            })?;
        parts = parts.part("files", part);
    }

    let _ = events.send(TransferEvent::Started {
        id,
        total_bytes: Some(total_bytes),
    });

    // Poll the shared counter while the request body drains so progress
    // keeps flowing without a second channel.
    let send = api.post(endpoints::UPLOAD).multipart(parts).send();
    tokio::pin!(send);
    let mut ticker = tokio::time::interval(PROGRESS_UPDATE_INTERVAL);
    let mut last_reported: u64 = 0;
    let outcome = loop {
        tokio::select! {
            outcome = &mut send => break outcome,
            _ = ticker.tick() => {
                let transferred = sent.load(Ordering::SeqCst);
                if transferred > last_reported {
                    last_reported = transferred;
                    let _ = events.send(TransferEvent::Progress {
                        id,
                        transferred_bytes: transferred,
                        total_bytes: Some(total_bytes),
                    });
                }
            }
        }
    };

    let response = match outcome {
        Ok(response) => response,
        Err(error) => {
            // A cancel mid-body surfaces as a broken request; report it as
            // the cancel it is.
            if is_cancelled(cancel_flag) {
                return Err(send_canceled_event(events, id));
            }
            return Err(send_failed_event(
                events,
                id,
                TransferError::Network(error.to_string()),
            ));
        }
    };

    if !response.status().is_success() {
        let error = error_from_response(response).await;
        return Err(send_failed_event(events, id, error));
    }

    // A 200 whose body carries `{error}` is still a failure; an
    // unparseable body falls back to trusting the status.
    let body = response.text().await.unwrap_or_default();
    if let Some(message) = error_message(&body) {
        return Err(send_failed_event(
            events,
            id,
            TransferError::Server {
                status: 200,
                message,
            },
        ));
    }
    if let Ok(ack) = serde_json::from_str::<MessageResponse>(&body) {
        debug!(%id, "server acknowledged upload: {}", ack.message);
    }

    if is_cancelled(cancel_flag) {
        return Err(send_canceled_event(events, id));
    }

    let _ = events.send(TransferEvent::Progress {
        id,
        transferred_bytes: total_bytes,
        total_bytes: Some(total_bytes),
    });
    let _ = events.send(TransferEvent::Completed {
        id,
        local_path: None,
    });
    Ok(())
}

// =============================================================================
// Download
// =============================================================================

/// Download a selection or the whole volume to a file under `dest_dir`.
///
/// The streamed strategy writes chunk by chunk with progress and cancel
/// checks; the form-encoded strategy buffers the whole body in one shot.
/// Single-file downloads with a passphrase are buffered regardless, since
/// the envelope must be complete before it can be opened.
async fn run_download(
    api: &ApiClient,
    id: Uuid,
    job: DownloadJob,
    events: &mpsc::UnboundedSender<TransferEvent>,
    cancel_flag: &Arc<AtomicBool>,
) -> Result<(), TransferError> {
    if job.strategy == DownloadStrategy::FormEncoded {
        return run_form_download(api, id, &job, events).await;
    }

    let request = match &job.source {
        DownloadSource::Selection(paths) => {
            api.post(endpoints::DOWNLOAD_SELECTED)
                .json(&DownloadSelectedRequest {
                    selected_paths: paths.clone(),
                    passphrase: job.passphrase.clone(),
                })
        }
        DownloadSource::EntireVolume => api.get(endpoints::DOWNLOAD_ALL),
    };

    let _ = events.send(TransferEvent::Started {
        id,
        total_bytes: None,
    });

    let response = match request.send().await {
        Ok(response) => response,
        Err(error) => {
            if is_cancelled(cancel_flag) {
                return Err(send_canceled_event(events, id));
            }
            return Err(send_failed_event(
                events,
                id,
                TransferError::Network(error.to_string()),
            ));
        }
    };

    if !response.status().is_success() {
        let error = error_from_response(response).await;
        return Err(send_failed_event(events, id, error));
    }

    if is_cancelled(cancel_flag) {
        return Err(send_canceled_event(events, id));
    }

    let file_name = response_file_name(&response, job.single_file);
    let dest = generate_unique_path(&job.dest_dir.join(file_name)).await;

    let decrypting = job.single_file && job.passphrase.is_some();
    let result = if decrypting {
        // The envelope has to be complete before it can be opened, so this
        // path buffers instead of streaming to disk.
        match read_body_to_memory(response, id, events, cancel_flag).await {
            Ok(buffered) => {
                let passphrase = job.passphrase.as_deref().unwrap_or_default();
                match open_envelope(&buffered, passphrase) {
                    Ok(plaintext) => write_file(&dest, &plaintext).await,
                    Err(error) => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    } else {
        stream_body_to_file(response, &dest, id, events, cancel_flag).await
    };

    match result {
        Ok(()) => {
            if is_cancelled(cancel_flag) {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(send_canceled_event(events, id));
            }
            let _ = events.send(TransferEvent::Completed {
                id,
                local_path: Some(dest),
            });
            Ok(())
        }
        Err(TransferError::Canceled) => {
            let _ = tokio::fs::remove_file(&dest).await;
            Err(send_canceled_event(events, id))
        }
        Err(error) => {
            let _ = tokio::fs::remove_file(&dest).await;
            Err(send_failed_event(events, id, error))
        }
    }
}

/// Degraded-platform download: one-shot form POST, body buffered whole.
///
/// No progress events and no cancel checks; the transfer jumps from Started
/// straight to its terminal event.
async fn run_form_download(
    api: &ApiClient,
    id: Uuid,
    job: &DownloadJob,
    events: &mpsc::UnboundedSender<TransferEvent>,
) -> Result<(), TransferError> {
    let _ = events.send(TransferEvent::Started {
        id,
        total_bytes: None,
    });

    let fetched = match &job.source {
        DownloadSource::Selection(paths) => {
            form::fetch_selection(api, paths, job.passphrase.as_deref()).await
        }
        DownloadSource::EntireVolume => form::fetch_entire_volume(api).await,
    };
    let (file_name, body) = match fetched {
        Ok(fetched) => fetched,
        Err(error) => return Err(send_failed_event(events, id, error)),
    };

    let file_name = file_name.unwrap_or_else(|| fallback_file_name(job.single_file).to_string());
    let dest = generate_unique_path(&job.dest_dir.join(file_name)).await;

    let payload = if job.single_file && job.passphrase.is_some() {
        let passphrase = job.passphrase.as_deref().unwrap_or_default();
        match open_envelope(&body, passphrase) {
            Ok(plaintext) => plaintext,
            Err(error) => return Err(send_failed_event(events, id, error)),
        }
    } else {
        body
    };

    if let Err(error) = write_file(&dest, &payload).await {
        let _ = tokio::fs::remove_file(&dest).await;
        return Err(send_failed_event(events, id, error));
    }

    let _ = events.send(TransferEvent::Completed {
        id,
        local_path: Some(dest),
    });
    Ok(())
}

/// Filename for a finished download: Content-Disposition when the server
/// names one, otherwise the fixed fallback for the route
fn response_file_name(response: &reqwest::Response, single_file: bool) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition)
        .and_then(|name| sanitize_filename(&name))
        .unwrap_or_else(|| fallback_file_name(single_file).to_string())
}

fn fallback_file_name(single_file: bool) -> &'static str {
    if single_file {
        SINGLE_FILE_FALLBACK_NAME
    } else {
        ARCHIVE_FALLBACK_NAME
    }
}

/// Parse and open a downloaded envelope; every failure mode collapses into
/// `Decryption` so callers cannot distinguish wrong passphrase from a
/// mangled payload
fn open_envelope(body: &[u8], passphrase: &str) -> Result<Vec<u8>, TransferError> {
    let text = std::str::from_utf8(body).map_err(|_| TransferError::Decryption)?;
    let envelope = EncryptionEnvelope::decode(text).map_err(|_| TransferError::Decryption)?;
    envelope
        .open(passphrase)
        .map_err(|_| TransferError::Decryption)
}

// =============================================================================
// Tests
// =============================================================================
