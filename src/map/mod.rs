//! Map rendering.
//!
//! This module provides the Mapbox tile source, the marker plugin, camera
//! animation and the [`poolbars_core::MapSurface`] implementation over `walkers`.

pub mod camera;
pub mod mapbox;
pub mod plugin;
pub mod surface;

pub use mapbox::streets_tiles;
pub use surface::{MapFrame, WalkersSurface};
