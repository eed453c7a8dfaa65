//! # diner: restaurant API with image upload ingestion
//!
//! `diner` serves the restaurant routes of a food-ordering backend: restaurant records and their
//! orders, products, and analytics. Almost all of the behaviour behind those routes belongs to a
//! [`RestaurantController`](restaurants::RestaurantController); this crate owns the HTTP surface
//! and the one piece with real engineering content, the ingestion of restaurant images.
//!
//! ## Uploads
//!
//! `POST /restaurants` and `PUT /restaurants/{restaurant_id}` take `multipart/form-data` bodies
//! with at most one `logo` and one `heroImage` file. The [`uploads`] module streams each file to
//! the configured `restaurants_folder` under a generated `{token}-{epochMillis}.{extension}` name
//! and hands the resulting [`StoredFile`](uploads::StoredFile)s to the controller. A request
//! either keeps all of its files or none: any failure, including one reported by the controller,
//! removes whatever that request had already written.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use diner::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = diner::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     diner::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod errors;
pub mod restaurants;
pub mod telemetry;
pub mod types;
pub mod uploads;

#[cfg(test)]
pub mod test_utils;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};

use crate::api::handlers::restaurants as handlers;
use crate::restaurants::{RestaurantController, memory::InMemoryRestaurants};
use crate::uploads::{DestinationResolver, UploadFieldSpec, UploadIngestor};

pub use types::RestaurantId;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .uploads(ingestor)
///     .restaurants(Arc::new(InMemoryRestaurants::new()))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub uploads: UploadIngestor,
    pub restaurants: Arc<dyn RestaurantController>,
}

/// Build the restaurant image ingestor from configuration.
pub fn create_ingestor(config: &Config) -> Result<UploadIngestor, errors::Error> {
    let root = config.restaurants_folder()?;
    Ok(UploadIngestor::new(DestinationResolver::new(root), UploadFieldSpec::restaurant_images())
        .with_max_file_size(config.uploads.max_file_size))
}

/// Build the application router with all routes and middleware.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> Router {
    // TODO: authentication/authorization middleware for restaurant mutations (owner-only
    // create/update/destroy, owner-only orders and analytics).
    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/restaurants", get(handlers::index).post(handlers::create))
        .route(
            "/restaurants/{restaurant_id}",
            get(handlers::show).put(handlers::update).delete(handlers::destroy),
        )
        .route("/restaurants/{restaurant_id}/orders", get(handlers::orders))
        .route("/restaurants/{restaurant_id}/products", get(handlers::products))
        .route("/restaurants/{restaurant_id}/analytics", get(handlers::analytics))
        .layer(DefaultBodyLimit::max(state.config.uploads.max_request_size))
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application: router plus the configuration it was built from.
///
/// 1. **Create**: [`Application::new`] builds the upload ingestor and router from a validated config
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until shutdown
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create an application backed by the in-memory restaurant controller
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_controller(config, Arc::new(InMemoryRestaurants::new()))
    }

    /// Create an application with a specific restaurant controller
    pub fn with_controller(config: Config, controller: Arc<dyn RestaurantController>) -> anyhow::Result<Self> {
        debug!("Starting restaurant service with configuration: {:#?}", config);

        let uploads = create_ingestor(&config)?;
        info!(
            restaurants_folder = %uploads.destination().root().display(),
            max_file_size = config.uploads.max_file_size,
            "Restaurant uploads configured"
        );

        let state = AppState::builder()
            .config(config.clone())
            .uploads(uploads)
            .restaurants(controller)
            .build();
        let router = build_router(&state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Restaurant service listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
