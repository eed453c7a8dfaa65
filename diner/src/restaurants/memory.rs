//! In-memory restaurant controller
//!
//! Keeps restaurants in a map for the lifetime of the process. Orders and products are not
//! modelled, so those routes return empty collections for known restaurants.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::{Error, Result};
use crate::restaurants::{Restaurant, RestaurantController, RestaurantForm};
use crate::types::RestaurantId;

#[derive(Debug, Default)]
pub struct InMemoryRestaurants {
    restaurants: DashMap<RestaurantId, Restaurant>,
    last_id: AtomicU64,
}

impl InMemoryRestaurants {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(id: RestaurantId) -> Error {
        Error::NotFound {
            resource: "Restaurant".to_string(),
            id: id.to_string(),
        }
    }

    fn ensure_exists(&self, id: RestaurantId) -> Result<()> {
        if self.restaurants.contains_key(&id) {
            Ok(())
        } else {
            Err(Self::not_found(id))
        }
    }
}

#[async_trait]
impl RestaurantController for InMemoryRestaurants {
    async fn index(&self) -> Result<Vec<Restaurant>> {
        let mut restaurants: Vec<Restaurant> = self.restaurants.iter().map(|entry| entry.value().clone()).collect();
        restaurants.sort_by_key(|r| r.id);
        Ok(restaurants)
    }

    async fn create(&self, form: RestaurantForm) -> Result<Restaurant> {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Utc::now();
        let restaurant = Restaurant {
            id,
            attributes: form.attributes,
            logo: form.logo.map(|f| f.generated_name),
            hero_image: form.hero_image.map(|f| f.generated_name),
            created_at: now,
            updated_at: now,
        };

        self.restaurants.insert(id, restaurant.clone());
        tracing::info!(restaurant_id = id, "Created restaurant");
        Ok(restaurant)
    }

    async fn show(&self, id: RestaurantId) -> Result<Restaurant> {
        self.restaurants
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn update(&self, id: RestaurantId, form: RestaurantForm) -> Result<Restaurant> {
        let mut entry = self.restaurants.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        let restaurant = entry.value_mut();

        restaurant.attributes.extend(form.attributes);
        if let Some(logo) = form.logo {
            restaurant.logo = Some(logo.generated_name);
        }
        if let Some(hero_image) = form.hero_image {
            restaurant.hero_image = Some(hero_image.generated_name);
        }
        restaurant.updated_at = Utc::now();

        tracing::info!(restaurant_id = id, "Updated restaurant");
        Ok(restaurant.clone())
    }

    async fn destroy(&self, id: RestaurantId) -> Result<()> {
        self.restaurants.remove(&id).ok_or_else(|| Self::not_found(id))?;
        tracing::info!(restaurant_id = id, "Deleted restaurant");
        Ok(())
    }

    async fn orders(&self, id: RestaurantId) -> Result<serde_json::Value> {
        self.ensure_exists(id)?;
        Ok(json!([]))
    }

    async fn products(&self, id: RestaurantId) -> Result<serde_json::Value> {
        self.ensure_exists(id)?;
        Ok(json!([]))
    }

    async fn analytics(&self, id: RestaurantId) -> Result<serde_json::Value> {
        self.ensure_exists(id)?;
        Ok(json!({ "restaurantId": id, "numOrders": 0 }))
    }
}
