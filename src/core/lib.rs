// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

pub mod events;
pub mod gps;
pub mod project;
pub mod segments;
pub mod session;
pub mod settings;
pub mod splitting;

pub use events::{ChannelObserver, SessionEvent, SessionObserver};
pub use gps::{GeoCoordinate, GpxTrack, TrackSample};
pub use project::ProjectFile;
pub use segments::{ExportSample, ExportSamples, SegmentSet, SegmentState, VideoSegment, BLACKOUT_MARGIN_S};
pub use session::{GeotagSession, MapClickOutcome, SharedSession};
pub use settings::GeotagSettings;
pub use splitting::SplitPoints;

#[derive(thiserror::Error, Debug)]
pub enum GeotagCoreError {
    #[error("Invalid data: {0}")]
    Format(String),

    #[error("GPX track contains no track points")]
    EmptyTrack,

    #[error("Segment is not synchronized")]
    NotSynchronized,

    #[error("Time {time:.3}s is outside of [{start:.3}s, {end:.3}s]")]
    OutOfRange { time: f64, start: f64, end: f64 },

    #[error("No entry found for time {0:.3}s")]
    NotFound(f64),

    #[error("Segment index {0} out of range")]
    SegmentIndex(usize),

    #[error("IO error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0:?}")]
    Json(#[from] serde_json::Error),
}

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
