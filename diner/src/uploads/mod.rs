//! Image upload ingestion for restaurant records.
//!
//! Restaurant create and update requests carry `multipart/form-data` bodies with up to one
//! `logo` and one `heroImage` file. This module turns those parts into files on disk:
//!
//! - [`DestinationResolver`] creates the configured destination root on demand
//! - [`naming`] produces `{token}-{epochMillis}.{extension}` storage names
//! - [`UploadFieldSpec`] declares which fields are accepted and how many files each may carry
//! - [`UploadIngestor`] streams each accepted part to disk and reports [`StoredFile`]s
//!
//! Nothing here inspects file contents; bytes are stored as received.

mod destination;
mod fields;
mod ingest;
pub mod naming;

pub use destination::DestinationResolver;
pub use fields::UploadFieldSpec;
pub use ingest::{FileDescriptor, IngestResult, IngestSession, RejectedPart, StoredFile, UploadIngestor};
