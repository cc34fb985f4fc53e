//! Configuration management for the city guide
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::GuideError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the city guide
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuideConfig {
    /// Overpass (OpenStreetMap) query service
    #[serde(default)]
    pub overpass: OverpassConfig,
    /// Language-model assistant
    #[serde(default)]
    pub llm: LlmConfig,
    /// Mapping service credentials (geocoding fallback)
    #[serde(default)]
    pub maps: MapsConfig,
    /// Crime overlay inputs
    #[serde(default)]
    pub crime: CrimeConfig,
    /// Map defaults
    #[serde(default)]
    pub map: MapConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Overpass API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassConfig {
    /// Interpreter endpoint
    #[serde(default = "default_overpass_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_overpass_timeout")]
    pub timeout_seconds: u32,
}

/// Language-model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; the assistant answers with a placeholder when absent
    pub api_key: Option<String>,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Request timeout in seconds; the HTTP client default when absent
    pub timeout_seconds: Option<u32>,
}

/// Mapping service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// API key for address geocoding; unused when absent
    pub api_key: Option<String>,
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
}

/// Crime overlay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeConfig {
    /// Path of the delimited crime statistics file
    #[serde(default = "default_crime_csv")]
    pub csv_path: String,
    /// District boundary GeoJSON document
    #[serde(default = "default_boundary_url")]
    pub boundary_url: String,
}

/// Map defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// City name appended to outbound search links
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_center_lng")]
    pub center_lng: f64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    /// Radius of place searches in meters
    #[serde(default = "default_radius")]
    pub radius_m: u32,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sessions unused for this long are discarded
    #[serde(default = "default_session_idle")]
    pub session_idle_minutes: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_overpass_timeout() -> u32 {
    30
}

fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-pro".to_string()
}

fn default_geocoding_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_crime_csv() -> String {
    "Berlin_crimes.csv".to_string()
}

fn default_boundary_url() -> String {
    "https://raw.githubusercontent.com/funkeinteraktiv/Berlin-Geodaten/master/berlin_bezirke.geojson"
        .to_string()
}

fn default_city() -> String {
    "Berlin".to_string()
}

fn default_center_lat() -> f64 {
    52.5200
}

fn default_center_lng() -> f64 {
    13.4050
}

fn default_zoom() -> u8 {
    14
}

fn default_radius() -> u32 {
    3000
}

fn default_port() -> u16 {
    8501
}

fn default_session_idle() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            base_url: default_overpass_url(),
            timeout_seconds: default_overpass_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_seconds: None,
        }
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocoding_url: default_geocoding_url(),
        }
    }
}

impl Default for CrimeConfig {
    fn default() -> Self {
        Self {
            csv_path: default_crime_csv(),
            boundary_url: default_boundary_url(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            zoom: default_zoom(),
            radius_m: default_radius(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            session_idle_minutes: default_session_idle(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl GuideConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CITYGUIDE_LLM__API_KEY -> llm.api_key
        builder = builder.add_source(
            Environment::with_prefix("CITYGUIDE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: GuideConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cityguide").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.overpass.base_url.is_empty() {
            self.overpass.base_url = default_overpass_url();
        }
        if self.overpass.timeout_seconds == 0 {
            self.overpass.timeout_seconds = default_overpass_timeout();
        }
        if self.llm.base_url.is_empty() {
            self.llm.base_url = default_llm_base_url();
        }
        if self.llm.model.is_empty() {
            self.llm.model = default_llm_model();
        }
        if self.maps.geocoding_url.is_empty() {
            self.maps.geocoding_url = default_geocoding_url();
        }
        if self.crime.csv_path.is_empty() {
            self.crime.csv_path = default_crime_csv();
        }
        if self.crime.boundary_url.is_empty() {
            self.crime.boundary_url = default_boundary_url();
        }
        if self.map.city.is_empty() {
            self.map.city = default_city();
        }
        if self.map.zoom == 0 {
            self.map.zoom = default_zoom();
        }
        if self.map.radius_m == 0 {
            self.map.radius_m = default_radius();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.server.session_idle_minutes == 0 {
            self.server.session_idle_minutes = default_session_idle();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Keys are optional, but an explicitly empty key is a mistake
    pub fn validate_api_keys(&self) -> Result<()> {
        if self.llm.api_key.as_deref().is_some_and(str::is_empty) {
            return Err(GuideError::config(
                "LLM API key cannot be empty if provided. Either remove it or provide a valid key.",
            )
            .into());
        }

        if self.maps.api_key.as_deref().is_some_and(str::is_empty) {
            return Err(GuideError::config(
                "Maps API key cannot be empty if provided. Either remove it or provide a valid key.",
            )
            .into());
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.overpass.timeout_seconds > 300 || self.llm.timeout_seconds.is_some_and(|t| t > 300) {
            return Err(GuideError::config("Request timeouts cannot exceed 300 seconds").into());
        }

        if !(-90.0..=90.0).contains(&self.map.center_lat) {
            return Err(GuideError::config(format!(
                "Map center latitude must be between -90 and 90, got: {}",
                self.map.center_lat
            ))
            .into());
        }

        if !(-180.0..=180.0).contains(&self.map.center_lng) {
            return Err(GuideError::config(format!(
                "Map center longitude must be between -180 and 180, got: {}",
                self.map.center_lng
            ))
            .into());
        }

        if self.map.zoom > 19 {
            return Err(GuideError::config("Map zoom cannot exceed 19").into());
        }

        if self.map.radius_m > 50_000 {
            return Err(GuideError::config("Search radius cannot exceed 50000 m").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(GuideError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(GuideError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Overpass", &self.overpass.base_url),
            ("LLM", &self.llm.base_url),
            ("Geocoding", &self.maps.geocoding_url),
            ("Boundary", &self.crime.boundary_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(GuideError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
