// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

/// User chosen cut points on the video timeline, kept sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SplitPoints {
    points: Vec<f64>,
}

impl SplitPoints {
    pub fn as_slice(&self) -> &[f64] { &self.points }
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn get(&self, index: usize) -> Option<f64> { self.points.get(index).copied() }

    /// Inserts `time_s` keeping the list sorted. Returns false (and changes nothing) if the point
    /// is not strictly inside `(0, duration_s)` or is already present.
    pub fn add(&mut self, time_s: f64, duration_s: f64) -> bool {
        if !(time_s > 0.0 && time_s < duration_s) {
            ::log::debug!("[splitting] Split point {:.3}s outside of (0, {:.3}s)", time_s, duration_s);
            return false;
        }
        match self.points.binary_search_by(|p| p.total_cmp(&time_s)) {
            Ok(_) => false,
            Err(pos) => {
                self.points.insert(pos, time_s);
                true
            }
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<f64> {
        if index < self.points.len() {
            Some(self.points.remove(index))
        } else {
            None
        }
    }

    /// Replaces all points, eg. from a project file. Points are sorted and deduplicated.
    pub fn set(&mut self, mut points: Vec<f64>) {
        points.retain(|p| p.is_finite());
        points.sort_by(f64::total_cmp);
        points.dedup();
        self.points = points;
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// Display form of each point, eg. "00:01:05.250".
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| format_video_time(*p)).collect()
    }
}

pub fn format_video_time(time_s: f64) -> String {
    let total_ms = (time_s.max(0.0) * 1000.0).round() as u64;
    let (h, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (m, rem) = (rem / 60_000, rem % 60_000);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, rem / 1000, rem % 1000)
}
