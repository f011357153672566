//! Depot Client Library
//!
//! Async client for a depot file server: directory listing and search,
//! batch management operations, and concurrent, cancelable,
//! progress-tracked uploads and downloads with optional client-side
//! payload encryption.
//!
//! `TransferCoordinator` is the entry point; everything else supports it.
//! The library logs through `tracing` and leaves subscriber installation
//! to the embedding application.

pub mod api;
pub mod config;
pub mod crypto;
pub mod transfers;

pub use api::ApiClient;
pub use config::{ClientConfig, PlatformCapabilities};
pub use crypto::{CryptoError, EncryptionEnvelope};
pub use transfers::{
    BatchOutcome, RemoteItem, Transfer, TransferCoordinator, TransferError, TransferEvent,
    TransferKind, TransferStatus, UploadFile,
};
