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

//! Mapbox raster tile source.

use std::fmt;
use std::path::PathBuf;

use eframe::egui;
use walkers::sources::{Attribution, TileSource};
use walkers::{HttpOptions, HttpTiles, TileId};

/// Mapbox style rendered as 256 px raster tiles.
pub const STREETS_STYLE: &str = "mapbox/streets-v11";

/// Tile source for a Mapbox style
pub struct MapboxTileSource {
    style: String,
    token: String,
}

impl MapboxTileSource {
    pub fn new(style: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            token: token.into(),
        }
    }

    /// The streets style with the given access token
    pub fn streets(token: impl Into<String>) -> Self {
        Self::new(STREETS_STYLE, token)
    }
}

impl fmt::Debug for MapboxTileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapboxTileSource")
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl TileSource for MapboxTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://api.mapbox.com/styles/v1/{}/tiles/256/{}/{}/{}?access_token={}",
            self.style, tile_id.zoom, tile_id.x, tile_id.y, self.token
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© Mapbox © OpenStreetMap",
            url: "https://www.mapbox.com/about/maps/",
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// Build the tile fetcher, caching tiles under `cache_dir` when given.
pub fn streets_tiles(token: &str, cache_dir: Option<PathBuf>, ctx: &egui::Context) -> HttpTiles {
    let source = MapboxTileSource::streets(token);
    match cache_dir {
        Some(cache) => {
            log::debug!("Caching map tiles in {}", cache.display());
            let options = HttpOptions {
                cache: Some(cache),
                ..Default::default()
            };
            HttpTiles::with_options(source, options, ctx.clone())
        }
        None => HttpTiles::new(source, ctx.clone()),
    }
}
