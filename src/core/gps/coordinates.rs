// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use nalgebra::Vector2;

use super::processing::lerp;

/// A single position on the globe. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoCoordinate {
    pub lat: f64,  // degrees, [-90, 90]
    pub lon: f64,  // degrees, [-180, 180]
    pub height: Option<f64>,  // meters, None when the log carried no elevation
}

/// A point ready to be written as `<trkpt>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPointRecord {
    pub lat: f64,
    pub lon: f64,
    pub time: DateTime<Utc>,
    pub ele: Option<f64>,
}

impl GeoCoordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon, height: None }
    }

    pub fn with_height(lat: f64, lon: f64, height: f64) -> Self {
        Self { lat, lon, height: Some(height) }
    }

    /// Inverse Web-Mercator projection of continuous tile coordinates. Height is unknown.
    pub fn from_tile(tile: Vector2<f64>, zoom: u32) -> Self {
        let n = tile_count(zoom);
        let lon = tile.x / n * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * tile.y / n)).sinh().atan().to_degrees();
        Self::new(lat, lon)
    }

    /// Forward Web-Mercator projection into fractional tile space at `zoom`.
    /// Latitudes at or beyond ±90° are not clamped and yield non-finite values.
    pub fn to_tile(&self, zoom: u32) -> Vector2<f64> {
        let n = tile_count(zoom);
        let x = (self.lon + 180.0) / 360.0 * n;
        let y = (1.0 - self.lat.to_radians().tan().asinh() / PI) / 2.0 * n;
        Vector2::new(x, y)
    }

    /// Linear interpolation, `alpha` 0 gives `self` and 1 gives `other`.
    /// Longitude is interpolated as a plain number, so tracks crossing the antimeridian are not handled.
    pub fn interpolate(&self, other: &GeoCoordinate, alpha: f64) -> GeoCoordinate {
        let height = match (self.height, other.height) {
            (Some(a), Some(b)) => Some(lerp(a, b, alpha)),
            _ => None,
        };
        GeoCoordinate {
            lat: lerp(self.lat, other.lat, alpha),
            lon: lerp(self.lon, other.lon, alpha),
            height,
        }
    }

    pub fn to_track_point(&self, time: DateTime<Utc>) -> TrackPointRecord {
        TrackPointRecord { lat: self.lat, lon: self.lon, time, ele: self.height }
    }
}

fn tile_count(zoom: u32) -> f64 {
    2f64.powi(zoom as i32)
}
