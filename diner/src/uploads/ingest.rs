//! Streaming ingestion of multipart file parts onto disk.
//!
//! An [`IngestSession`] is opened per request. Each part is checked against the
//! [`UploadFieldSpec`], named by [`naming::generate`], and streamed chunk by chunk into a newly
//! created file under the destination root. If the session fails, or is aborted by the caller,
//! every file it wrote is removed again; the caller only ever sees all of a request's files or none.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::pin::pin;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use super::{DestinationResolver, UploadFieldSpec, naming};
use crate::errors::{Error, Result};

/// One incoming file part: its client-supplied name and a stream of its bytes.
pub struct FileDescriptor<S> {
    pub original_name: String,
    /// Declared size, when the client sent one
    pub size_bytes: Option<u64>,
    pub stream: S,
}

impl<S> FileDescriptor<S> {
    /// Any directory part of `original_name` is dropped; only the final segment is kept.
    pub fn new(original_name: impl Into<String>, stream: S) -> Self {
        let original_name = original_name.into();
        Self {
            original_name: naming::basename(&original_name).to_string(),
            size_bytes: None,
            stream,
        }
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }
}

/// A file that has been fully written under the destination root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub field_name: String,
    /// Position within its field, in arrival order
    pub index: usize,
    pub generated_name: String,
    pub absolute_path: PathBuf,
    pub original_name: String,
    pub size_bytes: u64,
}

/// A part whose field is not declared; nothing was written for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedPart {
    pub field_name: String,
    pub original_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    pub files: BTreeMap<String, Vec<StoredFile>>,
    pub rejected: Vec<RejectedPart>,
}

impl IngestResult {
    pub fn field(&self, name: &str) -> &[StoredFile] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first(&self, name: &str) -> Option<&StoredFile> {
        self.field(name).first()
    }

    pub fn stored_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone)]
pub struct UploadIngestor {
    destination: DestinationResolver,
    spec: UploadFieldSpec,
    max_file_size: u64,
}

impl UploadIngestor {
    pub fn new(destination: DestinationResolver, spec: UploadFieldSpec) -> Self {
        Self {
            destination,
            spec,
            max_file_size: u64::MAX,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn destination(&self) -> &DestinationResolver {
        &self.destination
    }

    pub fn spec(&self) -> &UploadFieldSpec {
        &self.spec
    }

    /// Start ingesting one request. The destination root is ensured here, once.
    pub async fn begin(&self) -> Result<IngestSession<'_>> {
        self.destination.ensure().await?;
        Ok(IngestSession {
            ingestor: self,
            result: IngestResult::default(),
            written: Vec::new(),
        })
    }

    /// Ingest a whole sequence of `(field name, file)` parts in arrival order.
    pub async fn ingest<P, S, E>(&self, parts: P) -> Result<IngestResult>
    where
        P: Stream<Item = (String, FileDescriptor<S>)>,
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let mut session = self.begin().await?;
        let mut parts = pin!(parts);
        while let Some((field_name, descriptor)) = parts.next().await {
            session.accept(&field_name, descriptor).await?;
        }
        Ok(session.finish())
    }
}

/// Per-request ingestion state.
pub struct IngestSession<'a> {
    ingestor: &'a UploadIngestor,
    result: IngestResult,
    // Every path created by this session, including partially written ones
    written: Vec<PathBuf>,
}

impl IngestSession<'_> {
    /// Store or reject one part. On error, everything written by the session is rolled back.
    #[instrument(skip(self, descriptor), fields(original_name = %descriptor.original_name))]
    pub async fn accept<S, E>(&mut self, field_name: &str, descriptor: FileDescriptor<S>) -> Result<()>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let spec = &self.ingestor.spec;

        if !spec.is_declared(field_name) {
            debug!("Rejecting part for undeclared field");
            self.result.rejected.push(RejectedPart {
                field_name: field_name.to_string(),
                original_name: descriptor.original_name,
                reason: format!("Unexpected file field '{field_name}'"),
            });
            return Ok(());
        }

        let accepted = self.result.field(field_name).len();
        if let Err(e) = spec.check(field_name, accepted) {
            warn!(accepted, max_count = spec.max_count(field_name), "Field cardinality exceeded");
            self.rollback().await;
            return Err(e);
        }

        match self.write(field_name, accepted, descriptor).await {
            Ok(stored) => {
                info!(
                    generated_name = %stored.generated_name,
                    size_bytes = stored.size_bytes,
                    "Stored upload"
                );
                self.result.files.entry(field_name.to_string()).or_default().push(stored);
                Ok(())
            }
            Err(e) => {
                self.rollback().await;
                Err(e)
            }
        }
    }

    async fn write<S, E>(&mut self, field_name: &str, index: usize, descriptor: FileDescriptor<S>) -> Result<StoredFile>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let max_file_size = self.ingestor.max_file_size;
        let too_large = || Error::PayloadTooLarge {
            message: format!("File for field '{field_name}' exceeds maximum allowed size of {max_file_size} bytes"),
        };

        if descriptor.size_bytes.is_some_and(|size| size > max_file_size) {
            return Err(too_large());
        }

        let generated_name = naming::generate(&descriptor.original_name);
        let path = self.ingestor.destination.resolve(&generated_name);
        let storage_error = |source| Error::Storage { path: path.clone(), source };

        // create_new: a name collision fails the write instead of clobbering another upload
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(storage_error)?;
        self.written.push(path.clone());

        let mut stream = pin!(descriptor.stream);
        let mut total_size = 0u64;
        let mut chunk_number = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::BadRequest {
                message: format!("Failed to read file chunk for field '{field_name}': {e}"),
            })?;
            chunk_number += 1;
            total_size += chunk.len() as u64;

            if total_size > max_file_size {
                warn!(total_size, max_file_size, "File size limit exceeded, aborting upload");
                return Err(too_large());
            }

            file.write_all(&chunk).await.map_err(storage_error)?;
            tracing::trace!(chunk_number, chunk_size = chunk.len(), total_size, "Wrote chunk");
        }

        file.sync_all().await.map_err(storage_error)?;

        Ok(StoredFile {
            field_name: field_name.to_string(),
            index,
            generated_name,
            absolute_path: path,
            original_name: descriptor.original_name,
            size_bytes: total_size,
        })
    }

    pub fn result(&self) -> &IngestResult {
        &self.result
    }

    /// Hand the stored files over to the caller.
    pub fn finish(self) -> IngestResult {
        self.result
    }

    /// Discard the request: remove every file written so far.
    pub async fn abort(mut self) {
        self.rollback().await;
    }

    async fn rollback(&mut self) {
        for path in self.written.drain(..) {
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed upload from failed request"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove upload from failed request"),
            }
        }
        self.result = IngestResult::default();
    }
}
