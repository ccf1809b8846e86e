// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use chrono::{DateTime, Duration, NaiveTime, Utc};

use super::coordinates::GeoCoordinate;
use super::processing::{haversine_distance_m, planar_distance_sq_deg, Bounds2};
use crate::GeotagCoreError;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackSample {
    pub coordinates: GeoCoordinate,
    pub timestamp: DateTime<Utc>,  // as written in the log
    pub elapsed_s: f64,  // seconds since the first sample
}

/// Min/max latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// Time-stamped positions in log order. Sample order is taken from the source as-is;
/// elapsed times are expected to be ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxTrack {
    samples: Vec<TrackSample>,
    virtual_day_start: Option<DateTime<Utc>>,
}

impl GpxTrack {
    /// Builds a track from `(coordinates, timestamp)` pairs in log order.
    /// `day_start_hour` sets the hour of the virtual day start used for export timestamps.
    pub fn from_points(points: Vec<(GeoCoordinate, DateTime<Utc>)>, day_start_hour: u32) -> Result<Self, GeotagCoreError> {
        let start_time = match points.first() {
            Some((_, t)) => *t,
            None => return Err(GeotagCoreError::EmptyTrack),
        };
        let samples = points.into_iter().map(|(coordinates, timestamp)| TrackSample {
            coordinates,
            timestamp,
            elapsed_s: duration_to_secs(timestamp - start_time),
        }).collect();

        let day_start_time = NaiveTime::from_hms_opt(day_start_hour, 0, 0)
            .ok_or_else(|| GeotagCoreError::Format(format!("Invalid day start hour {}", day_start_hour)))?;
        let virtual_day_start = start_time.date_naive().and_time(day_start_time).and_utc();

        Ok(Self { samples, virtual_day_start: Some(virtual_day_start) })
    }

    pub fn len(&self) -> usize { self.samples.len() }
    pub fn is_empty(&self) -> bool { self.samples.is_empty() }
    pub fn samples(&self) -> &[TrackSample] { &self.samples }

    /// Reference time export timestamps are counted from.
    pub fn virtual_day_start(&self) -> Option<DateTime<Utc>> {
        self.virtual_day_start
    }

    /// Absolute timestamp for a position on the video timeline.
    pub fn export_timestamp(&self, video_time_s: f64) -> Result<DateTime<Utc>, GeotagCoreError> {
        let start = self.virtual_day_start.ok_or(GeotagCoreError::NotFound(video_time_s))?;
        Ok(start + secs_to_duration(video_time_s))
    }

    pub fn coordinate_points(&self) -> impl Iterator<Item = &GeoCoordinate> + '_ {
        self.samples.iter().map(|s| &s.coordinates)
    }

    pub fn total_duration(&self) -> Result<f64, GeotagCoreError> {
        self.samples.last().map(|s| s.elapsed_s).ok_or(GeotagCoreError::NotFound(0.0))
    }

    /// Sample with the smallest absolute elapsed-time difference, first one wins ties.
    pub fn nearest_sample(&self, elapsed_s: f64) -> Result<&TrackSample, GeotagCoreError> {
        self.samples.iter()
            .min_by(|a, b| (a.elapsed_s - elapsed_s).abs().total_cmp(&(b.elapsed_s - elapsed_s).abs()))
            .ok_or(GeotagCoreError::NotFound(elapsed_s))
    }

    /// Coordinates of the sample closest in time, used for marker placement.
    pub fn position_for_time(&self, elapsed_s: f64) -> Result<GeoCoordinate, GeotagCoreError> {
        self.nearest_sample(elapsed_s).map(|s| s.coordinates)
    }

    /// Sample closest to `coordinate` in a flat lat/lon plane.
    pub fn closest_by_position(&self, coordinate: &GeoCoordinate) -> Result<&TrackSample, GeotagCoreError> {
        let distance = |s: &TrackSample| planar_distance_sq_deg(s.coordinates.lat, s.coordinates.lon, coordinate.lat, coordinate.lon);
        self.samples.iter()
            .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))
            .ok_or(GeotagCoreError::NotFound(0.0))
    }

    /// Elapsed gpx time at which the track came closest to `coordinate`.
    pub fn closest_time(&self, coordinate: &GeoCoordinate) -> Result<f64, GeotagCoreError> {
        self.closest_by_position(coordinate).map(|s| s.elapsed_s)
    }

    /// Position at `elapsed_s`, linearly interpolated between the first sample (in log order)
    /// whose elapsed time exceeds the query and the one before it. Clamped to the first/last
    /// sample outside the track. Logs with clock jumps are not reordered.
    pub fn interpolated_at(&self, elapsed_s: f64) -> Result<GeoCoordinate, GeotagCoreError> {
        let last = self.samples.last().ok_or(GeotagCoreError::NotFound(elapsed_s))?;
        let upper = match self.samples.iter().position(|s| s.elapsed_s > elapsed_s) {
            Some(upper) => upper,
            None => return Ok(last.coordinates),
        };
        if upper == 0 {
            return Ok(self.samples[0].coordinates);
        }
        let lo = &self.samples[upper - 1];
        let hi = &self.samples[upper];
        let alpha = (elapsed_s - lo.elapsed_s) / (hi.elapsed_s - lo.elapsed_s);
        Ok(lo.coordinates.interpolate(&hi.coordinates, alpha))
    }

    pub fn bounding_box(&self) -> Result<GeoBoundingBox, GeotagCoreError> {
        let first = self.samples.first().ok_or(GeotagCoreError::NotFound(0.0))?.coordinates;
        let init = GeoBoundingBox { min_lat: first.lat, min_lon: first.lon, max_lat: first.lat, max_lon: first.lon };
        Ok(self.coordinate_points().fold(init, |b, c| GeoBoundingBox {
            min_lat: b.min_lat.min(c.lat),
            min_lon: b.min_lon.min(c.lon),
            max_lat: b.max_lat.max(c.lat),
            max_lon: b.max_lon.max(c.lon),
        }))
    }

    /// Bounding rectangle of the course in tile coordinates at `zoom`.
    pub fn tile_bounding_box(&self, zoom: u32) -> Result<Bounds2, GeotagCoreError> {
        Bounds2::from_points(self.coordinate_points().map(|c| c.to_tile(zoom)))
            .ok_or(GeotagCoreError::NotFound(0.0))
    }

    pub fn total_distance_m(&self) -> f64 {
        self.samples.windows(2).map(|w| {
            let (a, b) = (&w[0].coordinates, &w[1].coordinates);
            haversine_distance_m(a.lat, a.lon, b.lat, b.lon)
        }).sum()
    }

    pub fn summary_json(&self) -> serde_json::Value {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => serde_json::json!({
                "loaded": true,
                "points": self.len(),
                "start": first.timestamp.to_rfc3339(),
                "end": last.timestamp.to_rfc3339(),
                "duration_s": last.elapsed_s,
                "distance_m": self.total_distance_m(),
            }),
            _ => serde_json::json!({ "loaded": false }),
        }
    }
}

pub(crate) fn duration_to_secs(d: Duration) -> f64 {
    match d.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => d.num_milliseconds() as f64 / 1e3,
    }
}

pub(crate) fn secs_to_duration(s: f64) -> Duration {
    Duration::microseconds((s * 1e6).round() as i64)
}
