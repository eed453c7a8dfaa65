//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `DINER_CONFIG`
//! environment variable. A missing config file is not an error; every key can come from the
//! environment instead.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `DINER_` override YAML values
//! 3. **RESTAURANTS_FOLDER** - Special case: overrides `restaurants_folder` if set
//!
//! Nested values use double underscores, e.g. `DINER_UPLOADS__MAX_FILE_SIZE=1048576`.
//!
//! ## Required Settings
//!
//! `restaurants_folder` is the destination root for uploaded restaurant images. It has no
//! default: if it is absent, [`Config::load`] fails so the process never starts serving without
//! somewhere to put uploads.
//!
//! ```bash
//! RESTAURANTS_FOLDER=/var/lib/diner/restaurants
//! DINER_PORT=8080
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "DINER_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Directory where restaurant logos and hero images are written.
    /// Required; created on demand by the upload path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurants_folder: Option<PathBuf>,
    /// Upload size limits
    pub uploads: UploadsConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Size limits applied to multipart uploads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Maximum size of a single uploaded file in bytes
    pub max_file_size: u64,
    /// Maximum size of a whole request body in bytes
    pub max_request_size: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,    // 10 MiB
            max_request_size: 25 * 1024 * 1024, // 25 MiB
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            restaurants_folder: None,
            uploads: UploadsConfig::default(),
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        match &self.restaurants_folder {
            None => {
                return Err(Error::Configuration {
                    message: "restaurants_folder is not configured. \
                     Please set RESTAURANTS_FOLDER environment variable or add restaurants_folder to config file."
                        .to_string(),
                });
            }
            Some(folder) if folder.as_os_str().is_empty() => {
                return Err(Error::Configuration {
                    message: "restaurants_folder must not be empty".to_string(),
                });
            }
            Some(_) => {}
        }

        if self.uploads.max_file_size == 0 {
            return Err(Error::Configuration {
                message: "uploads.max_file_size must be greater than 0".to_string(),
            });
        }

        if self.uploads.max_request_size == 0 {
            return Err(Error::Configuration {
                message: "uploads.max_request_size must be greater than 0".to_string(),
            });
        }

        if self.uploads.max_file_size > self.uploads.max_request_size as u64 {
            return Err(Error::Configuration {
                message: format!(
                    "uploads.max_file_size ({}) cannot be greater than uploads.max_request_size ({})",
                    self.uploads.max_file_size, self.uploads.max_request_size
                ),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("DINER_").ignore(&["CONFIG"]).split("__"))
            .merge(
                Env::raw()
                    .only(&["RESTAURANTS_FOLDER"])
                    .map(|_| "restaurants_folder".into()),
            )
    }

    /// The destination root for uploads. Only valid on a validated config.
    pub fn restaurants_folder(&self) -> Result<PathBuf, Error> {
        self.restaurants_folder.clone().ok_or_else(|| Error::Configuration {
            message: "restaurants_folder is not configured".to_string(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
