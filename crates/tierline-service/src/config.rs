//! # Tierline Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TIERLINE_DB_PATH=/var/lib/tierline/tierline.db                     │
//! │     TIERLINE_CACHE_ENABLED=false                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tierline-storefront/tierline.toml (Linux)               │
//! │     ~/Library/Application Support/com.tierline.storefront/ (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     30 min term cache, 60 min listing cache, 10 per page               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "tierline.db"
//!
//! [cache]
//! enabled = true
//! terms_ttl_secs = 1800
//! listing_ttl_secs = 3600
//!
//! [listing]
//! default_taxonomy = "categories"
//! default_content_type = "blog"
//! page_size = 10
//! term_limit = 10
//!
//! [pricing]
//! thousands_separator = " "
//! currency_suffix = " руб."
//! trim_zero_fraction = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use tierline_core::PriceFormat;

use crate::error::{ServiceError, ServiceResult};

/// Longest TTL a cache entry may be given.
pub const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "tierline.db".to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// When false every filter request goes straight to the host.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lifetime of cached term lists (seconds).
    #[serde(default = "default_terms_ttl")]
    pub terms_ttl_secs: u64,

    /// Lifetime of cached listings (seconds).
    #[serde(default = "default_listing_ttl")]
    pub listing_ttl_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_terms_ttl() -> u64 {
    30 * 60
}

fn default_listing_ttl() -> u64 {
    60 * 60
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: true,
            terms_ttl_secs: default_terms_ttl(),
            listing_ttl_secs: default_listing_ttl(),
        }
    }
}

impl CacheSettings {
    pub fn terms_ttl(&self) -> Duration {
        Duration::from_secs(self.terms_ttl_secs)
    }

    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }
}

// =============================================================================
// Listing Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSettings {
    #[serde(default = "default_taxonomy")]
    pub default_taxonomy: String,

    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    /// Items per listing request.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Terms shown before the "more" toggle.
    #[serde(default = "default_term_limit")]
    pub term_limit: usize,

    /// Text of the empty-state block.
    #[serde(default = "default_empty_message")]
    pub empty_message: String,
}

fn default_taxonomy() -> String {
    "categories".to_string()
}

fn default_content_type() -> String {
    "blog".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_term_limit() -> usize {
    10
}

fn default_empty_message() -> String {
    "Записи не найдены".to_string()
}

impl Default for ListingSettings {
    fn default() -> Self {
        ListingSettings {
            default_taxonomy: default_taxonomy(),
            default_content_type: default_content_type(),
            page_size: default_page_size(),
            term_limit: default_term_limit(),
            empty_message: default_empty_message(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierlineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub listing: ListingSettings,

    /// Storefront price rendering.
    #[serde(default)]
    pub pricing: PriceFormat,
}

impl TierlineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tierline.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ServiceResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading tierline config from file");
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    ServiceError::ConfigLoadFailed(format!("{}: {}", path.display(), e))
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load tierline config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ServiceResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ServiceError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Tierline config saved");
        Ok(())
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.database.path.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "database.path must not be empty".into(),
            ));
        }

        for (name, ttl) in [
            ("cache.terms_ttl_secs", self.cache.terms_ttl_secs),
            ("cache.listing_ttl_secs", self.cache.listing_ttl_secs),
        ] {
            if ttl == 0 || ttl > MAX_CACHE_TTL_SECS {
                return Err(ServiceError::InvalidConfig(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_CACHE_TTL_SECS, ttl
                )));
            }
        }

        if self.listing.page_size == 0 {
            return Err(ServiceError::InvalidConfig(
                "listing.page_size must be greater than 0".into(),
            ));
        }

        if self.listing.default_taxonomy.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "listing.default_taxonomy must not be empty".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("TIERLINE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = path;
        }

        if let Ok(enabled) = std::env::var("TIERLINE_CACHE_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.cache.enabled = true,
                "0" | "false" | "no" | "off" => self.cache.enabled = false,
                _ => warn!(value = %enabled, "Unknown TIERLINE_CACHE_ENABLED value"),
            }
        }

        if let Ok(ttl) = std::env::var("TIERLINE_TERMS_TTL_SECS") {
            if let Ok(t) = ttl.parse::<u64>() {
                self.cache.terms_ttl_secs = t;
            }
        }

        if let Ok(ttl) = std::env::var("TIERLINE_LISTING_TTL_SECS") {
            if let Ok(t) = ttl.parse::<u64>() {
                self.cache.listing_ttl_secs = t;
            }
        }

        if let Ok(size) = std::env::var("TIERLINE_PAGE_SIZE") {
            if let Ok(s) = size.parse::<u32>() {
                debug!(page_size = s, "Overriding page size from environment");
                self.listing.page_size = s;
            }
        }

        if let Ok(suffix) = std::env::var("TIERLINE_CURRENCY_SUFFIX") {
            self.pricing.currency_suffix = suffix;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tierline", "storefront")
            .map(|dirs| dirs.config_dir().join("tierline.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn cache_enabled(&self) -> bool {
        self.cache.enabled
    }

    pub fn db_path(&self) -> &str {
        &self.database.path
    }
}
