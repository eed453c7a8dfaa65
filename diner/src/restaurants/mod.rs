//! Restaurant business-logic abstraction.
//!
//! This module defines the `RestaurantController` trait, the collaborator that the HTTP routes
//! delegate to once uploads have been ingested. Persistence, orders, products, and analytics all
//! live behind it. [`memory::InMemoryRestaurants`] is a process-local implementation used by the
//! binary and the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::types::RestaurantId;
use crate::uploads::{IngestResult, StoredFile};

pub mod memory;

/// A restaurant record as returned by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    /// Plain form fields (name, address, ...) as submitted
    pub attributes: BTreeMap<String, String>,
    /// Generated file name under the restaurants folder
    pub logo: Option<String>,
    pub hero_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for create and update: text fields plus the images that were stored for the request.
#[derive(Debug, Clone, Default)]
pub struct RestaurantForm {
    pub attributes: BTreeMap<String, String>,
    pub logo: Option<StoredFile>,
    pub hero_image: Option<StoredFile>,
}

impl RestaurantForm {
    pub fn new(attributes: BTreeMap<String, String>, uploads: &IngestResult) -> Self {
        Self {
            attributes,
            logo: uploads.first("logo").cloned(),
            hero_image: uploads.first("heroImage").cloned(),
        }
    }
}

/// Business logic behind the restaurant routes.
#[async_trait]
pub trait RestaurantController: Send + Sync {
    async fn index(&self) -> Result<Vec<Restaurant>>;

    async fn create(&self, form: RestaurantForm) -> Result<Restaurant>;

    async fn show(&self, id: RestaurantId) -> Result<Restaurant>;

    /// Merge `form` into an existing restaurant. Images not present in `form` are kept.
    async fn update(&self, id: RestaurantId, form: RestaurantForm) -> Result<Restaurant>;

    async fn destroy(&self, id: RestaurantId) -> Result<()>;

    async fn orders(&self, id: RestaurantId) -> Result<serde_json::Value>;

    async fn products(&self, id: RestaurantId) -> Result<serde_json::Value>;

    async fn analytics(&self, id: RestaurantId) -> Result<serde_json::Value>;
}
