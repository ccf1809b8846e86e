// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use nalgebra::Vector2;

// ============================================================================
// Coordinate math
// ============================================================================

const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[inline]
pub fn lerp(a: f64, b: f64, alpha: f64) -> f64 {
    a + (b - a) * alpha
}

/// Squared distance treating degrees of latitude and longitude as plain euclidean axes.
/// Only meaningful for small regions.
#[inline]
pub fn planar_distance_sq_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    dlat * dlat + dlon * dlon
}

// ============================================================================
// Bounds
// ============================================================================

/// Axis aligned bounds, `min` and `max` are componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub min: Vector2<f64>,
    pub max: Vector2<f64>,
}

impl Bounds2 {
    pub fn from_points<I: IntoIterator<Item = Vector2<f64>>>(points: I) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        Some(it.fold(Self { min: first, max: first }, |b, p| Self {
            min: b.min.inf(&p),
            max: b.max.sup(&p),
        }))
    }
}
