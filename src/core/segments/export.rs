// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use super::segment_set::SegmentSet;
use crate::gps::{GeoCoordinate, GpxTrack};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSample {
    pub coordinates: GeoCoordinate,
    pub video_time_s: f64,
    pub gpx_time_s: f64,
    pub segment_index: usize,
}

/// Lazy walk over the video timeline at `0, step, 2*step, ...` (strictly below the total duration),
/// followed by one sample at exactly the total duration.
///
/// A step yields a sample only if the first segment that contains it is clear of the
/// blackout margin and synchronized. Clone the iterator (or ask the segment set again) to restart.
#[derive(Debug, Clone)]
pub struct ExportSamples<'a> {
    segments: &'a SegmentSet,
    track: &'a GpxTrack,
    step_s: f64,
    margin_s: f64,
    next_step: u64,
    finished: bool,
}

impl<'a> ExportSamples<'a> {
    pub(crate) fn new(segments: &'a SegmentSet, track: &'a GpxTrack, step_s: f64, margin_s: f64) -> Self {
        if !(step_s > 0.0) {
            ::log::warn!("[export] Invalid step {}s, only the final point will be exported", step_s);
        }
        Self { segments, track, step_s, margin_s, next_step: 0, finished: false }
    }

    fn sample_at_step(&self, video_s: f64) -> Option<ExportSample> {
        let (index, segment) = self.segments.segments().iter().enumerate()
            .find(|(_, s)| s.contains(video_s) && s.can_export_at_with_margin(video_s, self.margin_s))?;
        self.sample(index, segment.gpx_time_for(video_s).ok()?, video_s)
    }

    fn final_sample(&self) -> Option<ExportSample> {
        let total = self.segments.total_duration();
        let index = self.segments.index_for_video_time(total).ok()?;
        let gpx_s = self.segments.segments()[index].gpx_time_for(total).ok()?;
        self.sample(index, gpx_s, total)
    }

    fn sample(&self, segment_index: usize, gpx_time_s: f64, video_time_s: f64) -> Option<ExportSample> {
        let coordinates = self.track.interpolated_at(gpx_time_s).ok()?;
        Some(ExportSample { coordinates, video_time_s, gpx_time_s, segment_index })
    }
}

impl<'a> Iterator for ExportSamples<'a> {
    type Item = ExportSample;

    fn next(&mut self) -> Option<ExportSample> {
        let total = self.segments.total_duration();
        while !self.finished {
            let video_s = self.next_step as f64 * self.step_s;
            if self.step_s > 0.0 && video_s < total {
                self.next_step += 1;
                if let Some(sample) = self.sample_at_step(video_s) {
                    return Some(sample);
                }
            } else {
                self.finished = true;
                return self.final_sample();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    /// Straight line north, one degree of latitude per 100 s of gpx time.
    fn line_track(seconds: i64) -> GpxTrack {
        let t0 = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc);
        let points = (0..=seconds / 10).map(|i| {
            (GeoCoordinate::new(i as f64 * 0.1, 5.0), t0 + Duration::seconds(i * 10))
        }).collect();
        GpxTrack::from_points(points, 6).unwrap()
    }

    #[test]
    fn test_single_segment_covers_every_step() {
        let track = line_track(1000);
        let mut set = SegmentSet::new(10.0);
        set.synchronize(0, 0.0, 100.0).unwrap();

        let samples: Vec<ExportSample> = set.export_samples(&track, 1.0).collect();
        let times: Vec<f64> = samples.iter().map(|s| s.video_time_s).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert!((samples[0].coordinates.lat - 1.0).abs() < 1e-9);
        assert!((samples[10].coordinates.lat - 1.1).abs() < 1e-9);
        assert_eq!(samples[10].gpx_time_s, 110.0);
    }

    #[test]
    fn test_final_sample_off_step() {
        let track = line_track(100);
        let mut set = SegmentSet::new(2.5);
        set.synchronize(0, 0.0, 0.0).unwrap();
        let times: Vec<f64> = set.export_samples(&track, 1.0).map(|s| s.video_time_s).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 2.5]);
    }

    #[test]
    fn test_unsynchronized_segment_is_skipped() {
        let track = line_track(1000);
        let mut set = SegmentSet::new(120.0);
        set.rebuild(&[60.0], 120.0);
        set.synchronize(1, 90.0, 500.0).unwrap();

        let samples: Vec<ExportSample> = set.export_samples(&track, 30.0).collect();
        let times: Vec<f64> = samples.iter().map(|s| s.video_time_s).collect();
        // 0 and 30 fall in the unsynchronized first segment, 60 is a split point
        assert_eq!(times, vec![90.0, 120.0]);
        assert!(samples.iter().all(|s| s.segment_index == 1));
        assert!((samples[0].coordinates.lat - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_blackout_around_interior_split() {
        let track = line_track(1000);
        let mut set = SegmentSet::new(20.0);
        set.rebuild(&[10.0], 20.0);
        set.synchronize(0, 5.0, 5.0).unwrap();
        set.synchronize(1, 15.0, 300.0).unwrap();

        let samples: Vec<ExportSample> = set.export_samples(&track, 1.0).collect();
        let times: Vec<f64> = samples.iter().map(|s| s.video_time_s).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0, 20.0]);
        assert_eq!(samples[7].segment_index, 0);
        assert_eq!(samples[8].segment_index, 1);
        assert_eq!(samples[8].gpx_time_s, 298.0);

        let tight: Vec<f64> = set.export_samples_with_margin(&track, 1.0, 0.0).map(|s| s.video_time_s).collect();
        assert_eq!(tight.len(), 21);
    }

    #[test]
    fn test_restartable() {
        let track = line_track(100);
        let mut set = SegmentSet::new(5.0);
        set.synchronize(0, 0.0, 0.0).unwrap();
        let it = set.export_samples(&track, 1.0);
        let first: Vec<ExportSample> = it.clone().collect();
        let second: Vec<ExportSample> = it.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn test_invalid_step_only_exports_final_point() {
        let track = line_track(100);
        let mut set = SegmentSet::new(5.0);
        set.synchronize(0, 0.0, 0.0).unwrap();
        let times: Vec<f64> = set.export_samples(&track, 0.0).map(|s| s.video_time_s).collect();
        assert_eq!(times, vec![5.0]);
    }
}
