use std::env;

/// Runtime configuration. Environment variables provide server defaults;
/// the CLI binary overrides them with `clap` flags.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    /// Per-page raster memory budget in bytes, enforced by the Rasterizer.
    pub max_page_bytes: usize,
    /// Total bytes of cached rasters the process will hold before evicting
    /// the LRU score.
    pub cache_byte_budget: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_page_bytes: 64 * 1024 * 1024,
            cache_byte_budget: 512 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Loads overrides from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = env::var("PARTBOOK_BIND_ADDRESS") {
            config.bind_address = v;
        }
        if let Ok(v) = env::var("PARTBOOK_MAX_PAGE_BYTES") {
            if let Ok(parsed) = v.parse() {
                config.max_page_bytes = parsed;
            }
        }
        if let Ok(v) = env::var("PARTBOOK_CACHE_BYTE_BUDGET") {
            if let Ok(parsed) = v.parse() {
                config.cache_byte_budget = parsed;
            }
        }
        config
    }
}

/// Mirrors the server binary's logging setup: env-driven level, no
/// timestamp noise in container logs.
pub fn configure_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "info" }),
    );
    builder.format_timestamp(None).init();
}
