//! Transfer management
//!
//! This module tracks uploads and downloads from enqueue to a terminal
//! state. The coordinator is the entry point: it validates requests,
//! creates records, and spawns one executor task per transfer; executors
//! report lifecycle events over a channel, and the registry folds those
//! events into the records callers poll.
//!
//! Key types:
//! - `TransferCoordinator` - enqueues work and exposes cancel and views
//! - `Transfer` - one tracked upload or download
//! - `TransferRegistry` - live records and their cancel flags
//! - `TransferEvent` - progress events from the executor
//! - `TransferError` - why a transfer or batch operation failed

mod coordinator;
mod executor;
mod registry;
mod types;

pub use coordinator::TransferCoordinator;
pub use executor::{
    DownloadJob, DownloadSource, DownloadStrategy, TransferEvent, TransferJob, UploadJob,
    execute_transfer,
};
pub use registry::TransferRegistry;
pub use types::{
    BatchOutcome, ItemFailure, RemoteItem, Transfer, TransferError, TransferKind, TransferStatus,
    UploadFile,
};
