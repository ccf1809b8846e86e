// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

pub mod export;
pub mod segment;
pub mod segment_set;

pub use export::{ExportSample, ExportSamples};
pub use segment::{SegmentState, VideoSegment, BLACKOUT_MARGIN_S};
pub use segment_set::SegmentSet;
