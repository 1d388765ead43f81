// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Settings live in a TOML file managed by `confy`. Every field has a serde
//! default so older or hand-trimmed files keep loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use poolbars_core::votes::VOTED_FILE_NAME;
use poolbars_core::{ConfiguredSecrets, LatLon, RetryPolicy, Secrets, SupabaseConfig};
use serde::{Deserialize, Serialize};

/// Name used for the config, data and cache directories.
pub const APP_NAME: &str = "poolbars-desktop";

/// Sign-up form for bars that are not on the map yet.
pub const DEFAULT_REGISTER_BAR_URL: &str = "https://forms.gle/RgaPjc3eYhankmUg8";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Initial map center latitude
    #[serde(default = "default_center_lat")]
    pub map_center_lat: f64,

    /// Initial map center longitude
    #[serde(default = "default_center_lon")]
    pub map_center_lon: f64,

    /// Initial map zoom level
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    /// Whether the bar list starts open
    #[serde(default)]
    pub show_list: bool,

    /// Width of the bar list panel
    #[serde(default = "default_list_width")]
    pub list_width: f32,

    /// Keep downloaded map tiles on disk
    #[serde(default = "default_true")]
    pub tile_cache: bool,

    /// Link behind the "+ Register Bar" button
    #[serde(default = "default_register_bar_url")]
    pub register_bar_url: String,

    /// Attempts for a vote before giving up
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay before the first vote retry, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// HTTP request timeout, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Map token and data store credentials; environment variables take precedence
    #[serde(default)]
    pub secrets: ConfiguredSecrets,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_center_lat() -> f64 {
    37.773_972
}

fn default_center_lon() -> f64 {
    -122.431_297
}

fn default_zoom() -> f64 {
    12.0
}

fn default_list_width() -> f32 {
    320.0
}

fn default_true() -> bool {
    true
}

fn default_register_bar_url() -> String {
    DEFAULT_REGISTER_BAR_URL.to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            map_center_lat: default_center_lat(),
            map_center_lon: default_center_lon(),
            default_zoom: default_zoom(),
            show_list: false,
            list_width: default_list_width(),
            tile_cache: true,
            register_bar_url: default_register_bar_url(),
            retry_attempts: default_retry_attempts(),
            retry_initial_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            secrets: ConfiguredSecrets::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, writing defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, "config")
    }

    /// Get the config file path for display to user
    pub fn config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, "config")
    }

    /// Where the map opens
    #[must_use]
    pub fn home(&self) -> LatLon {
        LatLon::new(self.map_center_lat, self.map_center_lon)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
        }
    }

    /// Data store settings for the resolved secrets
    #[must_use]
    pub fn supabase_config(&self, secrets: &Secrets) -> SupabaseConfig {
        SupabaseConfig::new(&secrets.supabase_url, &secrets.supabase_anon_key)
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_retry(self.retry_policy())
    }

    /// Tile cache directory, if caching is enabled
    #[must_use]
    pub fn tile_cache_dir(&self) -> Option<PathBuf> {
        self.tile_cache.then(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join(APP_NAME)
                .join("tiles")
        })
    }
}

/// Platform data directory for this application
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Location of the voted-bars file inside `data_dir`
#[must_use]
pub fn voted_path(data_dir: &Path) -> PathBuf {
    data_dir.join(VOTED_FILE_NAME)
}
