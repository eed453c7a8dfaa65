//! Test utilities for handler tests.

use axum_test::TestServer;
use std::path::Path;

use crate::config::Config;

pub fn create_test_config(restaurants_folder: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        restaurants_folder: Some(restaurants_folder.to_path_buf()),
        ..Default::default()
    }
}

pub fn create_test_app(restaurants_folder: &Path) -> TestServer {
    create_test_app_with_config(create_test_config(restaurants_folder))
}

pub fn create_test_app_with_config(config: Config) -> TestServer {
    let app = crate::Application::new(config).expect("Failed to create application");
    app.into_test_server()
}

/// Number of files under the destination root, zero if it does not exist yet.
pub fn stored_files(root: &Path) -> usize {
    std::fs::read_dir(root).map(|entries| entries.count()).unwrap_or(0)
}
