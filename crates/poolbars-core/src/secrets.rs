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

//! Startup secrets: the map token and the data store credentials.
//!
//! Each value comes from the environment first, then from the config file.
//! Empty or whitespace-only values count as missing.

use std::fmt;

use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAPBOX_TOKEN_VARS: [&str; 2] = ["POOLBARS_MAPBOX_TOKEN", "NEXT_PUBLIC_MAPBOX_TOKEN"];
const SUPABASE_URL_VARS: [&str; 2] = ["POOLBARS_SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"];
const SUPABASE_KEY_VARS: [&str; 2] = ["POOLBARS_SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"];

/// Errors that keep the application from starting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StartupError {
    #[error("missing {name}: set {env} or add `{key}` to the config file")]
    MissingSecret {
        name: &'static str,
        env: &'static str,
        key: &'static str,
    },

    #[error("invalid {name}: {reason}")]
    InvalidSecret { name: &'static str, reason: String },
}

/// Secrets as written in the config file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredSecrets {
    #[serde(default)]
    pub mapbox_token: Option<String>,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
}

impl fmt::Debug for ConfiguredSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredSecrets")
            .field("mapbox_token", &self.mapbox_token.as_ref().map(|_| "<set>"))
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &self.supabase_anon_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Fully resolved secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub mapbox_token: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("mapbox_token", &"<redacted>")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Resolve every secret from the process environment and `configured`.
    pub fn from_env(configured: &ConfiguredSecrets) -> Result<Self, StartupError> {
        Self::resolve(configured, |var| std::env::var(var).ok())
    }

    /// Resolve every secret, asking `lookup` for environment variables.
    pub fn resolve(
        configured: &ConfiguredSecrets,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StartupError> {
        let pick = |name: &'static str,
                    vars: [&'static str; 2],
                    key: &'static str,
                    from_config: Option<&String>|
         -> Result<String, StartupError> {
            for var in vars {
                if let Some(value) = non_empty(lookup(var)) {
                    debug!("{name} taken from ${var}");
                    return Ok(value);
                }
            }
            if let Some(value) = non_empty(from_config.cloned()) {
                debug!("{name} taken from config file");
                return Ok(value);
            }
            Err(StartupError::MissingSecret {
                name,
                env: vars[0],
                key,
            })
        };

        let mapbox_token = pick(
            "map access token",
            MAPBOX_TOKEN_VARS,
            "mapbox_token",
            configured.mapbox_token.as_ref(),
        )?;
        let supabase_url = pick(
            "data store URL",
            SUPABASE_URL_VARS,
            "supabase_url",
            configured.supabase_url.as_ref(),
        )?;
        let supabase_anon_key = pick(
            "data store key",
            SUPABASE_KEY_VARS,
            "supabase_anon_key",
            configured.supabase_anon_key.as_ref(),
        )?;

        check_url(&supabase_url)?;

        Ok(Self {
            mapbox_token,
            supabase_url,
            supabase_anon_key,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_url(url: &str) -> Result<(), StartupError> {
    let invalid = |reason: String| StartupError::InvalidSecret {
        name: "data store URL",
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}
