//! HTTP handlers for the restaurant routes.
//!
//! Create and update accept `multipart/form-data`. Parts that carry a filename are files and go
//! through the [`UploadIngestor`]; the rest are plain text fields handed to the controller as
//! restaurant attributes. If anything fails after files were written (including the controller
//! itself), the files written for that request are removed before the error is returned.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use std::collections::BTreeMap;

use crate::AppState;
use crate::api::models::restaurants::{RestaurantWriteResponse, UploadsResponse};
use crate::errors::{Error, Result};
use crate::restaurants::{Restaurant, RestaurantForm};
use crate::types::RestaurantId;
use crate::uploads::{FileDescriptor, IngestSession, UploadIngestor};

/// Read every multipart part: files are ingested, text fields collected as attributes.
async fn read_form<'a>(
    ingestor: &'a UploadIngestor,
    mut multipart: Multipart,
) -> Result<(BTreeMap<String, String>, IngestSession<'a>)> {
    let mut session = ingestor.begin().await?;
    let mut attributes = BTreeMap::new();

    let outcome = async {
        while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", e),
        })? {
            let name = field.name().unwrap_or("").to_string();

            match field.file_name().map(str::to_string) {
                Some(original_name) => {
                    session.accept(&name, FileDescriptor::new(original_name, field)).await?;
                }
                None => {
                    let value = field.text().await.map_err(|e| Error::BadRequest {
                        message: format!("Failed to read field '{}': {}", name, e),
                    })?;
                    if !name.is_empty() {
                        attributes.insert(name, value);
                    }
                }
            }
        }
        Ok::<(), Error>(())
    }
    .await;

    match outcome {
        Ok(()) => Ok((attributes, session)),
        Err(e) => {
            session.abort().await;
            Err(e)
        }
    }
}

#[tracing::instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Restaurant>>> {
    Ok(Json(state.restaurants.index().await?))
}

#[tracing::instrument(skip_all)]
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> Result<(StatusCode, Json<RestaurantWriteResponse>)> {
    let (attributes, session) = read_form(&state.uploads, multipart).await?;
    let uploads = UploadsResponse::from(session.result());
    let form = RestaurantForm::new(attributes, session.result());

    match state.restaurants.create(form).await {
        Ok(restaurant) => {
            session.finish();
            Ok((StatusCode::CREATED, Json(RestaurantWriteResponse { restaurant, uploads })))
        }
        Err(e) => {
            session.abort().await;
            Err(e)
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(restaurant_id): Path<RestaurantId>) -> Result<Json<Restaurant>> {
    Ok(Json(state.restaurants.show(restaurant_id).await?))
}

#[tracing::instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path(restaurant_id): Path<RestaurantId>,
    multipart: Multipart,
) -> Result<Json<RestaurantWriteResponse>> {
    // Fail before touching the disk when the restaurant does not exist
    state.restaurants.show(restaurant_id).await?;

    let (attributes, session) = read_form(&state.uploads, multipart).await?;
    let uploads = UploadsResponse::from(session.result());
    let form = RestaurantForm::new(attributes, session.result());

    match state.restaurants.update(restaurant_id, form).await {
        Ok(restaurant) => {
            session.finish();
            Ok(Json(RestaurantWriteResponse { restaurant, uploads }))
        }
        Err(e) => {
            session.abort().await;
            Err(e)
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn destroy(State(state): State<AppState>, Path(restaurant_id): Path<RestaurantId>) -> Result<StatusCode> {
    state.restaurants.destroy(restaurant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn orders(State(state): State<AppState>, Path(restaurant_id): Path<RestaurantId>) -> Result<Json<serde_json::Value>> {
    Ok(Json(state.restaurants.orders(restaurant_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn products(State(state): State<AppState>, Path(restaurant_id): Path<RestaurantId>) -> Result<Json<serde_json::Value>> {
    Ok(Json(state.restaurants.products(restaurant_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn analytics(State(state): State<AppState>, Path(restaurant_id): Path<RestaurantId>) -> Result<Json<serde_json::Value>> {
    Ok(Json(state.restaurants.analytics(restaurant_id).await?))
}

#[cfg(test)]
mod tests {
    use crate::api::models::restaurants::RestaurantWriteResponse;
    use crate::restaurants::Restaurant;
    use crate::test_utils::{create_test_app, stored_files};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::Value;
    use tempfile::TempDir;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR-logo-bytes";
    const JPG_BYTES: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF-hero-bytes";

    #[test_log::test(tokio::test)]
    async fn test_create_with_logo_and_hero_image() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("restaurants");
        let server = create_test_app(&root);

        let form = MultipartForm::new()
            .add_text("name", "Casa Pepe")
            .add_part("logo", Part::bytes(PNG_BYTES.to_vec()).file_name("photo.png").mime_type("image/png"))
            .add_part("heroImage", Part::bytes(JPG_BYTES.to_vec()).file_name("banner.jpg").mime_type("image/jpeg"));

        let response = server.post("/restaurants").multipart(form).await;
        response.assert_status(StatusCode::CREATED);

        let body: RestaurantWriteResponse = response.json();
        assert_eq!(body.restaurant.attributes.get("name").map(String::as_str), Some("Casa Pepe"));
        assert!(body.uploads.rejected.is_empty());

        let logo = &body.uploads.files["logo"];
        let hero = &body.uploads.files["heroImage"];
        assert_eq!(logo.len(), 1);
        assert_eq!(hero.len(), 1);
        assert!(logo[0].generated_name.ends_with(".png"));
        assert!(hero[0].generated_name.ends_with(".jpg"));

        let logo_name = body.restaurant.logo.expect("logo recorded");
        let hero_name = body.restaurant.hero_image.expect("hero image recorded");
        assert_eq!(logo_name, logo[0].generated_name);
        assert!(!response.text().contains(&*root.to_string_lossy()));
        assert_eq!(std::fs::read(root.join(&logo_name)).unwrap(), PNG_BYTES);
        assert_eq!(std::fs::read(root.join(&hero_name)).unwrap(), JPG_BYTES);

        assert_eq!(stored_files(&root), 2);
    }

    #[tokio::test]
    async fn test_create_with_two_logos_stores_nothing() {
        let temp = TempDir::new().unwrap();
        let server = create_test_app(temp.path());

        let form = MultipartForm::new()
            .add_text("name", "Casa Pepe")
            .add_part("logo", Part::bytes(PNG_BYTES.to_vec()).file_name("first.png"))
            .add_part("logo", Part::bytes(PNG_BYTES.to_vec()).file_name("second.png"));

        let response = server.post("/restaurants").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("logo"));

        assert_eq!(stored_files(temp.path()), 0);

        let index = server.get("/restaurants").await;
        index.assert_status_ok();
        assert!(index.json::<Vec<Restaurant>>().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_file_field() {
        let temp = TempDir::new().unwrap();
        let server = create_test_app(temp.path());

        let form = MultipartForm::new()
            .add_part("banner", Part::bytes(JPG_BYTES.to_vec()).file_name("wide.jpg"))
            .add_part("logo", Part::bytes(PNG_BYTES.to_vec()).file_name("photo.png"));

        let response = server.post("/restaurants").multipart(form).await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert!(body["uploads"]["files"].get("banner").is_none());
        assert_eq!(body["uploads"]["rejected"][0]["fieldName"], "banner");
        assert_eq!(body["uploads"]["rejected"][0]["originalName"], "wide.jpg");
        assert!(body["restaurant"]["heroImage"].is_null());

        assert_eq!(stored_files(temp.path()), 1);
    }

    #[tokio::test]
    async fn test_create_with_directory_in_file_name() {
        let temp = TempDir::new().unwrap();
        let server = create_test_app(temp.path());

        let form = MultipartForm::new()
            .add_part("logo", Part::bytes(PNG_BYTES.to_vec()).file_name("albums.v2/logo"));

        let response = server.post("/restaurants").multipart(form).await;
        response.assert_status(StatusCode::CREATED);

        let body: RestaurantWriteResponse = response.json();
        let logo = &body.uploads.files["logo"][0];
        assert_eq!(logo.original_name, "logo");
        assert!(logo.generated_name.ends_with(".logo"));
        assert_eq!(std::fs::read(temp.path().join(&logo.generated_name)).unwrap(), PNG_BYTES);
        assert_eq!(stored_files(temp.path()), 1);
    }

    #[tokio::test]
    async fn test_create_without_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("restaurants");
        let server = create_test_app(&root);

        let form = MultipartForm::new().add_text("name", "Casa Pepe").add_text("address", "Calle Mayor 1");

        let response = server.post("/restaurants").multipart(form).await;
        response.assert_status(StatusCode::CREATED);

        let body: RestaurantWriteResponse = response.json();
        assert!(body.restaurant.logo.is_none());
        assert!(body.uploads.files.is_empty());
        assert_eq!(body.restaurant.attributes.len(), 2);
        // Destination is still ensured per request
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut config = crate::test_utils::create_test_config(temp.path());
        config.uploads.max_file_size = 16;
        let server = crate::test_utils::create_test_app_with_config(config);

        let form = MultipartForm::new().add_part("logo", Part::bytes(vec![0u8; 64]).file_name("huge.png"));

        let response = server.post("/restaurants").multipart(form).await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(stored_files(temp.path()), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_logo_and_keeps_hero_image() {
        let temp = TempDir::new().unwrap();
        let server = create_test_app(temp.path());

        let create = MultipartForm::new()
            .add_text("name", "Casa Pepe")
            .add_part("logo", Part::bytes(PNG_BYTES.to_vec()).file_name("old.png"))
            .add_part("heroImage", Part::bytes(JPG_BYTES.to_vec()).file_name("banner.jpg"));
        let created: RestaurantWriteResponse = server.post("/restaurants").multipart(create).await.json();
        let id = created.restaurant.id;

        let update = MultipartForm::new()
            .add_text("address", "Calle Mayor 1")
            .add_part("logo", Part::bytes(b"new-logo".to_vec()).file_name("new.webp"));
        let response = server.put(&format!("/restaurants/{id}")).multipart(update).await;
        response.assert_status_ok();

        let updated: RestaurantWriteResponse = response.json();
        let logo = updated.restaurant.logo.expect("logo replaced");
        assert_ne!(Some(logo.clone()), created.restaurant.logo);
        assert!(logo.ends_with(".webp"));
        assert_eq!(std::fs::read(temp.path().join(&logo)).unwrap(), b"new-logo");
        assert_eq!(updated.restaurant.hero_image, created.restaurant.hero_image);
        assert_eq!(updated.restaurant.attributes.get("name").map(String::as_str), Some("Casa Pepe"));

        // Old files are not cleaned up
        assert_eq!(stored_files(temp.path()), 3);
    }

    #[tokio::test]
    async fn test_update_unknown_restaurant_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("restaurants");
        let server = create_test_app(&root);

        let form = MultipartForm::new().add_part("logo", Part::bytes(PNG_BYTES.to_vec()).file_name("photo.png"));
        let response = server.put("/restaurants/42").multipart(form).await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(stored_files(&root), 0);
    }

    #[tokio::test]
    async fn test_show_destroy_and_sub_resources() {
        let temp = TempDir::new().unwrap();
        let server = create_test_app(temp.path());

        let form = MultipartForm::new().add_text("name", "Casa Pepe");
        let created: RestaurantWriteResponse = server.post("/restaurants").multipart(form).await.json();
        let id = created.restaurant.id;

        let shown: Restaurant = server.get(&format!("/restaurants/{id}")).await.json();
        assert_eq!(shown, created.restaurant);

        server.get(&format!("/restaurants/{id}/orders")).await.assert_status_ok();
        server.get(&format!("/restaurants/{id}/products")).await.assert_status_ok();
        let analytics: Value = server.get(&format!("/restaurants/{id}/analytics")).await.json();
        assert_eq!(analytics["restaurantId"], id);

        server
            .delete(&format!("/restaurants/{id}"))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/restaurants/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/restaurants/{id}/orders"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
