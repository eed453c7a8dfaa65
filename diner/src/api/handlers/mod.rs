//! HTTP request handlers.
//!
//! - [`restaurants`]: restaurant routes, including multipart image ingestion
//!
//! Handlers return [`crate::errors::Error`] which converts to the matching HTTP status code.

pub mod restaurants;
