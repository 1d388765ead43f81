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

//! Bar and vote records as the data store serves them.
//!
//! Rows are decoded leniently: the backend is edited by hand, so numeric
//! columns may be null or hold text, and newer weekday columns may be missing
//! on older rows. Nothing here fails a whole fetch because of one odd cell.

use chrono::Weekday;
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::geo::LatLon;

/// Stable identifier of a bar row.
pub type BarId = i64;

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Weekdays in display order, Monday first.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Lowercase English weekday name, as used in the `free_pool_<day>` columns.
#[must_use]
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Per-weekday "free pool offered that day" flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreePoolDays {
    #[serde(rename = "free_pool_monday", default, deserialize_with = "lenient_bool")]
    pub monday: bool,
    #[serde(rename = "free_pool_tuesday", default, deserialize_with = "lenient_bool")]
    pub tuesday: bool,
    #[serde(rename = "free_pool_wednesday", default, deserialize_with = "lenient_bool")]
    pub wednesday: bool,
    #[serde(rename = "free_pool_thursday", default, deserialize_with = "lenient_bool")]
    pub thursday: bool,
    #[serde(rename = "free_pool_friday", default, deserialize_with = "lenient_bool")]
    pub friday: bool,
    #[serde(rename = "free_pool_saturday", default, deserialize_with = "lenient_bool")]
    pub saturday: bool,
    #[serde(rename = "free_pool_sunday", default, deserialize_with = "lenient_bool")]
    pub sunday: bool,
}

impl FreePoolDays {
    /// Whether free pool is offered on `day`.
    #[must_use]
    pub fn on(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// All days with free pool, Monday first.
    #[must_use]
    pub fn days(&self) -> Vec<Weekday> {
        WEEK.into_iter().filter(|day| self.on(*day)).collect()
    }
}

/// A venue with pool-table and amenity metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub id: BarId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(rename = "long", default, deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,
    /// Number of pool tables; `None` when the row holds no usable number.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub num_tables: Option<u32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub guinness: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub live_table: bool,
    /// Website URL, stored in the `z` column.
    #[serde(rename = "z", default, deserialize_with = "lenient_url")]
    pub website: Option<String>,
    #[serde(flatten)]
    pub free_pool: FreePoolDays,
}

impl Bar {
    /// Map position, present only when both coordinates are finite numbers.
    #[must_use]
    pub fn position(&self) -> Option<LatLon> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(LatLon::new(lat, lon))
            }
            _ => None,
        }
    }

    /// Whether free pool is offered on `day`.
    #[must_use]
    pub fn has_free_pool_on(&self, day: Weekday) -> bool {
        self.free_pool.on(day)
    }

    /// Table count for display, `?` when unknown.
    #[must_use]
    pub fn tables_label(&self) -> String {
        self.num_tables
            .map_or_else(|| "?".to_string(), |n| n.to_string())
    }

    /// Map search link for the bar's address.
    #[must_use]
    pub fn maps_search_url(&self) -> Option<String> {
        Url::parse_with_params(MAPS_SEARCH_URL, &[("api", "1"), ("query", self.address.as_str())])
            .ok()
            .map(String::from)
    }
}

/// One row of the vote tally table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub bar_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok()))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_u64).unwrap_or(0))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

fn lenient_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = lenient_string(deserializer)?;
    let trimmed = value.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
