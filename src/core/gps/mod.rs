// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

pub mod coordinates;
pub mod data;
pub mod io;
pub mod processing;

// Re-export commonly used types
pub use coordinates::{GeoCoordinate, TrackPointRecord};
pub use data::{GeoBoundingBox, GpxTrack, TrackSample};
pub use io::{parse_gpx_from_str, parse_gpx_file, parse_gpx_time, write_gpx, save_gpx_file};
pub use processing::{haversine_distance_m, Bounds2};
