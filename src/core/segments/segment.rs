// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use crate::GeotagCoreError;

/// Minimum distance (seconds) to an interior split point for a time to be exported.
pub const BLACKOUT_MARGIN_S: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Synchronization {
    anchor_video_s: f64,
    offset_s: f64,  // gpx time - video time
}

/// Persisted synchronization of one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SegmentState {
    pub is_synchronized: bool,
    pub correction_offset_s: f64,
    pub synchronization_time_s: f64,
}

/// A contiguous span `[start, end]` of video time. Once synchronized, the whole span maps to
/// gpx time by a single constant offset fixed at the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSegment {
    start_s: f64,
    end_s: f64,
    sync: Option<Synchronization>,
    is_first: bool,
    is_last: bool,
}

impl VideoSegment {
    /// `start_s <= end_s` is expected from the caller.
    pub fn new(start_s: f64, end_s: f64) -> Self {
        debug_assert!(start_s <= end_s, "segment start {} after end {}", start_s, end_s);
        Self { start_s, end_s, sync: None, is_first: false, is_last: false }
    }

    /// Marks whether this segment is at the very start or end of the video. Outer
    /// boundaries have no blackout margin.
    pub fn with_outer_boundaries(mut self, is_first: bool, is_last: bool) -> Self {
        self.is_first = is_first;
        self.is_last = is_last;
        self
    }

    pub fn start(&self) -> f64 { self.start_s }
    pub fn end(&self) -> f64 { self.end_s }
    pub fn is_first(&self) -> bool { self.is_first }
    pub fn is_last(&self) -> bool { self.is_last }
    pub fn is_synchronized(&self) -> bool { self.sync.is_some() }
    pub fn mid_point(&self) -> f64 { (self.start_s + self.end_s) * 0.5 }

    pub fn anchor_video_time(&self) -> Option<f64> { self.sync.map(|s| s.anchor_video_s) }
    pub fn offset(&self) -> Option<f64> { self.sync.map(|s| s.offset_s) }

    pub fn contains(&self, video_s: f64) -> bool {
        video_s >= self.start_s && video_s <= self.end_s
    }

    /// Returns a copy anchored at `video_s` <-> `gpx_s`, replacing any previous anchor.
    pub fn with_synchronization(&self, video_s: f64, gpx_s: f64) -> Result<Self, GeotagCoreError> {
        self.check_contains(video_s)?;
        Ok(Self {
            sync: Some(Synchronization { anchor_video_s: video_s, offset_s: gpx_s - video_s }),
            ..self.clone()
        })
    }

    pub fn without_synchronization(&self) -> Self {
        Self { sync: None, ..self.clone() }
    }

    pub fn gpx_time_for(&self, video_s: f64) -> Result<f64, GeotagCoreError> {
        let sync = self.sync.ok_or(GeotagCoreError::NotSynchronized)?;
        self.check_contains(video_s)?;
        Ok(video_s + sync.offset_s)
    }

    pub fn video_time_for(&self, gpx_s: f64) -> Result<f64, GeotagCoreError> {
        let sync = self.sync.ok_or(GeotagCoreError::NotSynchronized)?;
        let video_s = gpx_s - sync.offset_s;
        self.check_contains(video_s)?;
        Ok(video_s)
    }

    /// Whether this segment is synchronized and maps `gpx_s` inside its span.
    pub fn is_responsible_gpx_time(&self, gpx_s: f64) -> bool {
        self.video_time_for(gpx_s).is_ok()
    }

    pub fn can_export_at(&self, video_s: f64) -> bool {
        self.can_export_at_with_margin(video_s, BLACKOUT_MARGIN_S)
    }

    /// In range and at least `margin_s` away from each interior boundary.
    pub fn can_export_at_with_margin(&self, video_s: f64, margin_s: f64) -> bool {
        if !self.contains(video_s) {
            return false;
        }
        let clear_of_start = self.is_first || video_s - self.start_s >= margin_s;
        let clear_of_end = self.is_last || self.end_s - video_s >= margin_s;
        clear_of_start && clear_of_end
    }

    pub fn save_state(&self) -> SegmentState {
        match self.sync {
            Some(s) => SegmentState { is_synchronized: true, correction_offset_s: s.offset_s, synchronization_time_s: s.anchor_video_s },
            None => SegmentState::default(),
        }
    }

    pub fn restore_state(&self, state: &SegmentState) -> Result<Self, GeotagCoreError> {
        if !state.is_synchronized {
            return Ok(self.without_synchronization());
        }
        self.check_contains(state.synchronization_time_s)?;
        Ok(Self {
            sync: Some(Synchronization { anchor_video_s: state.synchronization_time_s, offset_s: state.correction_offset_s }),
            ..self.clone()
        })
    }

    /// List label, eg. "Segment 03 - Synced". `index` is zero based.
    pub fn label(&self, index: usize) -> String {
        if self.is_synchronized() {
            format!("Segment {:02} - Synced", index + 1)
        } else {
            format!("Segment {:02}", index + 1)
        }
    }

    fn check_contains(&self, video_s: f64) -> Result<(), GeotagCoreError> {
        if self.contains(video_s) {
            Ok(())
        } else {
            Err(GeotagCoreError::OutOfRange { time: video_s, start: self.start_s, end: self.end_s })
        }
    }
}
