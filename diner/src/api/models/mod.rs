//! Response models for the API.

pub mod restaurants;
