//! Common type definitions.

/// Restaurant identifier, as used in `/restaurants/{restaurant_id}` paths
pub type RestaurantId = u64;
