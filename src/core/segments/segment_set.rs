// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use super::export::ExportSamples;
use super::segment::{SegmentState, VideoSegment, BLACKOUT_MARGIN_S};
use crate::gps::GpxTrack;
use crate::GeotagCoreError;

/// Ordered, contiguous segments covering exactly `[0, total_duration]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSet {
    segments: Vec<VideoSegment>,
    total_duration_s: f64,
    generation: u64,
}

impl Default for SegmentSet {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl SegmentSet {
    /// A single unsynchronized segment spanning the whole video.
    pub fn new(total_duration_s: f64) -> Self {
        let mut set = Self { segments: Vec::new(), total_duration_s, generation: 0 };
        set.rebuild(&[], total_duration_s);
        set
    }

    /// Replaces all segments with `[0, p1], [p1, p2], ..., [pn, total]`. All synchronization is
    /// discarded. Split points are expected ascending and strictly inside `(0, total)`; others are dropped.
    pub fn rebuild(&mut self, split_points: &[f64], total_duration_s: f64) {
        let mut bounds = Vec::with_capacity(split_points.len() + 2);
        bounds.push(0.0);
        for &p in split_points {
            let prev = bounds[bounds.len() - 1];
            if p > prev && p < total_duration_s {
                bounds.push(p);
            } else {
                ::log::warn!("[segments] Ignoring split point {:.3}s (previous {:.3}s, duration {:.3}s)", p, prev, total_duration_s);
            }
        }
        bounds.push(total_duration_s.max(0.0));

        let count = bounds.len() - 1;
        let segments = bounds.windows(2).enumerate().map(|(i, w)| {
            VideoSegment::new(w[0], w[1]).with_outer_boundaries(i == 0, i + 1 == count)
        }).collect();

        self.segments = segments;
        self.total_duration_s = total_duration_s;
        self.generation += 1;
        ::log::debug!("[segments] Rebuilt {} segment(s) over {:.3}s, generation {}", count, total_duration_s, self.generation);
    }

    pub fn segments(&self) -> &[VideoSegment] { &self.segments }
    pub fn len(&self) -> usize { self.segments.len() }
    pub fn is_empty(&self) -> bool { self.segments.is_empty() }
    pub fn get(&self, index: usize) -> Option<&VideoSegment> { self.segments.get(index) }
    pub fn total_duration(&self) -> f64 { self.total_duration_s }

    /// Incremented on every rebuild, so observers can drop state tied to an older segment list.
    pub fn generation(&self) -> u64 { self.generation }

    /// Index of the first segment containing `video_s`. Shared boundaries resolve to the earlier segment.
    pub fn index_for_video_time(&self, video_s: f64) -> Result<usize, GeotagCoreError> {
        self.segments.iter().position(|s| s.contains(video_s))
            .ok_or(GeotagCoreError::NotFound(video_s))
    }

    pub fn segment_for_video_time(&self, video_s: f64) -> Result<&VideoSegment, GeotagCoreError> {
        self.index_for_video_time(video_s).map(|i| &self.segments[i])
    }

    /// First synchronized segment mapping `gpx_s` into its span. `None` is a normal outcome.
    pub fn segment_for_gpx_time(&self, gpx_s: f64) -> Option<(usize, &VideoSegment)> {
        self.segments.iter().enumerate().find(|(_, s)| s.is_responsible_gpx_time(gpx_s))
    }

    /// Anchors segment `index` at `video_s` <-> `gpx_s`, replacing the list entry.
    pub fn synchronize(&mut self, index: usize, video_s: f64, gpx_s: f64) -> Result<&VideoSegment, GeotagCoreError> {
        let segment = self.segments.get(index).ok_or(GeotagCoreError::SegmentIndex(index))?;
        let synced = segment.with_synchronization(video_s, gpx_s)?;
        ::log::info!("[segments] Segment {} synchronized: video {:.3}s <-> gpx {:.3}s", index + 1, video_s, gpx_s);
        self.segments[index] = synced;
        Ok(&self.segments[index])
    }

    pub fn clear_synchronization(&mut self, index: usize) -> Result<(), GeotagCoreError> {
        let segment = self.segments.get(index).ok_or(GeotagCoreError::SegmentIndex(index))?;
        self.segments[index] = segment.without_synchronization();
        Ok(())
    }

    pub fn all_synchronized(&self) -> bool {
        self.segments.iter().all(|s| s.is_synchronized())
    }

    pub fn labels(&self) -> Vec<String> {
        self.segments.iter().enumerate().map(|(i, s)| s.label(i)).collect()
    }

    pub fn save_states(&self) -> Vec<SegmentState> {
        self.segments.iter().map(|s| s.save_state()).collect()
    }

    /// Applies saved states pairwise. Nothing is changed if any state does not fit its segment.
    pub fn restore_states(&mut self, states: &[SegmentState]) -> Result<(), GeotagCoreError> {
        if states.len() != self.segments.len() {
            ::log::warn!("[segments] Restoring {} saved state(s) onto {} segment(s)", states.len(), self.segments.len());
        }
        let mut restored = self.segments.clone();
        for (segment, state) in restored.iter_mut().zip(states) {
            *segment = segment.restore_state(state)?;
        }
        self.segments = restored;
        Ok(())
    }

    /// Walks the video timeline in `step_s` increments, see [`ExportSamples`].
    pub fn export_samples<'a>(&'a self, track: &'a GpxTrack, step_s: f64) -> ExportSamples<'a> {
        ExportSamples::new(self, track, step_s, BLACKOUT_MARGIN_S)
    }

    pub fn export_samples_with_margin<'a>(&'a self, track: &'a GpxTrack, step_s: f64, margin_s: f64) -> ExportSamples<'a> {
        ExportSamples::new(self, track, step_s, margin_s)
    }
}
