//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for the restaurant routes
//! - **[`models`]**: Response data structures
//!
//! # API Structure
//!
//! - **Restaurants** (`/restaurants`, `/restaurants/{restaurant_id}`): CRUD, with `logo` and
//!   `heroImage` multipart uploads on create and update
//! - **Restaurant sub-resources** (`/restaurants/{restaurant_id}/orders`, `/products`,
//!   `/analytics`): read-only views delegated to the restaurant controller

pub mod handlers;
pub mod models;
