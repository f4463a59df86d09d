//! Server configuration read from the environment.
//!
//!   ENGINE_REST_BIND_ADDR        - listen address (default: 0.0.0.0:8080)
//!   ENGINE_REST_BASE_PATH        - mount point of every route (default: /engine-rest)
//!   ENGINE_REST_DATA_FORMATS     - comma-separated object serialization formats
//!   ENGINE_REST_MAX_UPLOAD_BYTES - request body cap (default: 10 MiB)

use anyhow::Context;
use engine_rest_core::value::DataFormatRegistry;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_BASE_PATH: &str = "/engine-rest";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Empty when routes are served from the root.
    pub base_path: String,
    pub data_formats: DataFormatRegistry,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            data_formats: DataFormatRegistry::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("ENGINE_REST_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(path) = lookup("ENGINE_REST_BASE_PATH") {
            config.base_path = normalize_base_path(&path);
        }
        if let Some(formats) = lookup("ENGINE_REST_DATA_FORMATS") {
            config.data_formats = DataFormatRegistry::from_list(&formats);
        }
        if let Some(limit) = lookup("ENGINE_REST_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit
                .trim()
                .parse()
                .with_context(|| format!("ENGINE_REST_MAX_UPLOAD_BYTES is not a size: {limit}"))?;
        }

        Ok(config)
    }
}

/// `""` and `"/"` mount at the root; anything else gets exactly one leading
/// slash and no trailing one.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
