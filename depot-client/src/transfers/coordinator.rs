//! Transfer coordinator - the public face of the transfer subsystem
//!
//! The coordinator owns one ApiClient, one registry, and the event channel
//! that ties them together. Enqueue calls validate their inputs, create
//! records, and spawn one executor task per transfer; a background pump
//! task folds executor events into the registry. Callers poll the registry
//! views for live state and cancel by id.
//!
//! Each coordinator is self-contained. Two coordinators never share
//! records, flags, or channels, so independent instances can target
//! different servers side by side.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use depot_api::paths::is_safe_relative_path;
use depot_api::types::DirectoryListing;

use crate::api::ApiClient;
use crate::config::ClientConfig;

use super::executor::{
    DownloadJob, DownloadSource, DownloadStrategy, TransferEvent, TransferJob, UploadJob,
    execute_transfer,
};
use super::registry::TransferRegistry;
use super::types::{BatchOutcome, RemoteItem, Transfer, TransferError, UploadFile};

/// Coordinates uploads, downloads, and management calls against one server
pub struct TransferCoordinator {
    api: Arc<ApiClient>,
    registry: Arc<TransferRegistry>,
    events: mpsc::UnboundedSender<TransferEvent>,
    strategy: DownloadStrategy,
    pump: JoinHandle<()>,
}

impl TransferCoordinator {
    /// Create a coordinator for the server described by `config`.
    ///
    /// Must be called from within a tokio runtime; the event pump runs as a
    /// background task for the life of the coordinator. The download
    /// strategy is fixed here from the platform capabilities and never
    /// re-evaluated per request.
    pub fn new(config: ClientConfig) -> Result<Self, TransferError> {
        let strategy = if config.platform.streaming_downloads {
            DownloadStrategy::Streamed
        } else {
            DownloadStrategy::FormEncoded
        };
        let api = Arc::new(ApiClient::new(config)?);
        let registry = Arc::new(TransferRegistry::new());

        let (events, mut receiver) = mpsc::unbounded_channel::<TransferEvent>();
        let pump_registry = Arc::clone(&registry);
        let pump = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                pump_registry.apply(&event);
            }
        });

        Ok(Self {
            api,
            registry,
            events,
            strategy,
            pump,
        })
    }

    // =========================================================================
    // Enqueue
    // =========================================================================

    /// Queue one upload per file, all targeting `remote_dir`.
    ///
    /// Files are not serialized: each gets its own record, its own request,
    /// and its own cancel flag, so one transfer finishing or failing never
    /// affects its siblings. Returns the record ids in input order.
    pub fn enqueue_upload(
        &self,
        files: Vec<UploadFile>,
        remote_dir: &str,
        passphrase: Option<String>,
    ) -> Result<Vec<Uuid>, TransferError> {
        validate_passphrase(passphrase.as_deref())?;
        validate_upload_names(&files)?;

        let encrypted = passphrase.is_some();
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            // Sealed sizes are only known once the executor encrypts, so
            // encrypted records start without a total.
            let total_bytes = (!encrypted).then(|| file.contents.len() as u64);
            let record = Transfer::new_upload(
                file.name.clone(),
                remote_dir.to_string(),
                total_bytes,
                encrypted,
            );
            ids.push(record.id);

            let job = TransferJob::Upload(UploadJob {
                files: vec![file],
                remote_dir: remote_dir.to_string(),
                passphrase: passphrase.clone(),
            });
            self.spawn_executor(record, job);
        }
        Ok(ids)
    }

    /// Queue a folder upload as one aggregate transfer.
    ///
    /// File names are slash-separated paths relative to the folder being
    /// uploaded; the server recreates the layout under `remote_dir`. The
    /// whole folder travels in a single request, so it gets a single record
    /// whose progress spans every file.
    pub fn enqueue_folder_upload(
        &self,
        files: Vec<UploadFile>,
        remote_dir: &str,
        passphrase: Option<String>,
    ) -> Result<Uuid, TransferError> {
        validate_passphrase(passphrase.as_deref())?;
        validate_upload_names(&files)?;

        let encrypted = passphrase.is_some();
        let total_bytes =
            (!encrypted).then(|| files.iter().map(|f| f.contents.len() as u64).sum());
        let record = Transfer::new_upload(
            folder_display_name(&files),
            remote_dir.to_string(),
            total_bytes,
            encrypted,
        );
        let id = record.id;

        let job = TransferJob::Upload(UploadJob {
            files,
            remote_dir: remote_dir.to_string(),
            passphrase,
        });
        self.spawn_executor(record, job);
        Ok(id)
    }

    /// Queue a download of the selected items into `dest_dir`.
    ///
    /// Exactly one selected file downloads as itself; anything else (several
    /// items, or a single directory) arrives as a server-built zip archive.
    /// The passphrase rides to the server either way, but only a single
    /// file is opened as an envelope on this side.
    pub fn enqueue_download(
        &self,
        selection: Vec<RemoteItem>,
        dest_dir: PathBuf,
        passphrase: Option<String>,
    ) -> Result<Uuid, TransferError> {
        validate_passphrase(passphrase.as_deref())?;
        if selection.is_empty() {
            return Err(TransferError::InvalidRequest(
                "nothing selected for download".to_string(),
            ));
        }

        let single_file = selection.len() == 1 && !selection[0].is_directory;
        let paths: Vec<String> = selection.iter().map(|item| item.path.clone()).collect();
        let record = Transfer::new_download(
            download_display_name(&selection),
            paths.clone(),
            passphrase.is_some(),
        );
        let id = record.id;

        let job = TransferJob::Download(DownloadJob {
            source: DownloadSource::Selection(paths),
            dest_dir,
            passphrase,
            single_file,
            strategy: self.strategy,
        });
        self.spawn_executor(record, job);
        Ok(id)
    }

    /// Queue a download of the entire volume as one archive
    pub fn enqueue_download_all(&self, dest_dir: PathBuf) -> Uuid {
        let record = Transfer::new_download("all files".to_string(), Vec::new(), false);
        let id = record.id;

        let job = TransferJob::Download(DownloadJob {
            source: DownloadSource::EntireVolume,
            dest_dir,
            passphrase: None,
            single_file: false,
            strategy: self.strategy,
        });
        self.spawn_executor(record, job);
        id
    }

    /// Hand a record and its work to a fresh executor task
    fn spawn_executor(&self, record: Transfer, job: TransferJob) {
        let cancel_flag = self.registry.register(record.clone());
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let id = record.id;
            let task_events = events.clone();
            let task = tokio::spawn(async move {
                execute_transfer(&api, &record, job, &task_events, &cancel_flag).await
            });
            // A panicked executor cannot report its own failure; without
            // this the record would sit Active forever.
            if let Err(join_error) = task.await
                && join_error.is_panic()
            {
                let _ = events.send(TransferEvent::Failed {
                    id,
                    error: TransferError::Network(format!("transfer task failed: {join_error}")),
                });
            }
        });
    }

    // =========================================================================
    // Cancel and registry views
    // =========================================================================

    /// Cancel a transfer by id.
    ///
    /// The record flips to Canceled before this returns; the underlying
    /// request is torn down shortly after, whenever its executor next
    /// checks the flag. Returns false for unknown or already-finished ids.
    pub fn cancel(&self, id: Uuid) -> bool {
        self.registry.cancel(id)
    }

    /// Current copy of one record
    pub fn get(&self, id: Uuid) -> Option<Transfer> {
        self.registry.get(id)
    }

    /// Copies of all records, oldest first
    pub fn snapshot(&self) -> Vec<Transfer> {
        self.registry.snapshot()
    }

    /// Number of transfers not yet in a terminal state
    pub fn active_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Retire a finished record, returning it; live records are refused
    pub fn acknowledge(&self, id: Uuid) -> Option<Transfer> {
        self.registry.acknowledge(id)
    }

    /// Drop every finished record, returning how many were removed
    pub fn clear_finished(&self) -> usize {
        self.registry.clear_finished()
    }

    // =========================================================================
    // Management operations
    // =========================================================================

    /// List a server directory
    pub async fn list(&self, path: &str) -> Result<DirectoryListing, TransferError> {
        self.api.list(path).await
    }

    /// Search the whole volume by name fragment
    pub async fn search(&self, query: &str) -> Result<DirectoryListing, TransferError> {
        self.api.search(query).await
    }

    /// Delete files and directories; partial failures surface as
    /// `TransferError::Partial` with both outcome sets
    pub async fn delete_items(&self, paths: &[String]) -> Result<BatchOutcome, TransferError> {
        self.api.delete_items(paths).await
    }

    /// Move items into a destination directory; partial failures surface as
    /// `TransferError::Partial` with both outcome sets
    pub async fn move_items(
        &self,
        source_paths: &[String],
        destination_path: &str,
    ) -> Result<BatchOutcome, TransferError> {
        self.api.move_items(source_paths, destination_path).await
    }

    /// Create an empty folder under `path`
    pub async fn create_folder(&self, path: &str, folder_name: &str) -> Result<(), TransferError> {
        self.api.create_folder(path, folder_name).await
    }

    /// Create an empty file under `path`
    pub async fn create_file(&self, path: &str, file_name: &str) -> Result<(), TransferError> {
        self.api.create_file(path, file_name).await
    }
}

impl Drop for TransferCoordinator {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

// =============================================================================
// Validation and naming helpers
// =============================================================================

/// Reject blank passphrases before any crypto or network work happens
fn validate_passphrase(passphrase: Option<&str>) -> Result<(), TransferError> {
    if let Some(passphrase) = passphrase
        && passphrase.trim().is_empty()
    {
        return Err(TransferError::InvalidRequest(
            "passphrase must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Reject empty batches and unsafe names before any record is created
fn validate_upload_names(files: &[UploadFile]) -> Result<(), TransferError> {
    if files.is_empty() {
        return Err(TransferError::InvalidRequest(
            "no files to upload".to_string(),
        ));
    }
    for file in files {
        if !is_safe_relative_path(&file.name) {
            return Err(TransferError::InvalidRequest(format!(
                "unsafe file name: {}",
                file.name
            )));
        }
    }
    Ok(())
}

/// Display name for a folder upload: the shared root segment
fn folder_display_name(files: &[UploadFile]) -> String {
    files
        .first()
        .and_then(|file| file.name.split('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("folder")
        .to_string()
}

/// Display name for a download: the item's own name, or a count
fn download_display_name(selection: &[RemoteItem]) -> String {
    match selection {
        [single] => single
            .path
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(single.path.as_str())
            .to_string(),
        items => format!("{} items", items.len()),
    }
}

// =============================================================================
// Tests
// =============================================================================
