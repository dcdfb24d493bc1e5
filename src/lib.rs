//! CSV report uploader over SFTP
//!
//! Resolves one SSH credential from [`config::Settings`], then uploads each
//! [`dataset::NamedDataset`] of a batch as a CSV file under a remote base
//! directory.

pub mod config;
pub mod dataset;
pub mod error;
pub mod events;
pub mod logging;
pub mod sftp;
pub mod ssh;
pub mod transfer_log;
pub mod uploader;
pub mod validation;

pub use dataset::NamedDataset;
pub use error::TransferError;
pub use uploader::ReportUploader;
