use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::restaurants::Restaurant;
use crate::uploads::{IngestResult, RejectedPart, StoredFile};

/// A stored upload as reported to clients (no server paths)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFileResponse {
    pub index: usize,
    pub generated_name: String,
    pub original_name: String,
    pub size_bytes: u64,
}

impl From<&StoredFile> for StoredFileResponse {
    fn from(file: &StoredFile) -> Self {
        Self {
            index: file.index,
            generated_name: file.generated_name.clone(),
            original_name: file.original_name.clone(),
            size_bytes: file.size_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedPartResponse {
    pub field_name: String,
    pub original_name: String,
    pub reason: String,
}

impl From<&RejectedPart> for RejectedPartResponse {
    fn from(part: &RejectedPart) -> Self {
        Self {
            field_name: part.field_name.clone(),
            original_name: part.original_name.clone(),
            reason: part.reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadsResponse {
    pub files: BTreeMap<String, Vec<StoredFileResponse>>,
    pub rejected: Vec<RejectedPartResponse>,
}

impl From<&IngestResult> for UploadsResponse {
    fn from(result: &IngestResult) -> Self {
        Self {
            files: result
                .files
                .iter()
                .map(|(field, files)| (field.clone(), files.iter().map(StoredFileResponse::from).collect()))
                .collect(),
            rejected: result.rejected.iter().map(RejectedPartResponse::from).collect(),
        }
    }
}

/// Response for restaurant create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantWriteResponse {
    pub restaurant: Restaurant,
    pub uploads: UploadsResponse,
}
