// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use crate::segments::BLACKOUT_MARGIN_S;

pub const DEFAULT_EXPORT_STEP_S: f64 = 1.0;
pub const DEFAULT_TILE_ZOOM: u32 = 14;
pub const DEFAULT_VIRTUAL_DAY_START_HOUR: u32 = 6;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GeotagSettings {
    pub export_step_s: f64,  // seconds of video time between exported points
    pub blackout_margin_s: f64,  // no export this close to an interior split
    pub tile_zoom: u32,  // map tile scaling level
    pub virtual_day_start_hour: u32,  // hour (UTC) exported timestamps count from
    pub creator: String,
}

impl Default for GeotagSettings {
    fn default() -> Self {
        Self {
            export_step_s: DEFAULT_EXPORT_STEP_S,
            blackout_margin_s: BLACKOUT_MARGIN_S,
            tile_zoom: DEFAULT_TILE_ZOOM,
            virtual_day_start_hour: DEFAULT_VIRTUAL_DAY_START_HOUR,
            creator: format!("video-geotagger {}", crate::get_version()),
        }
    }
}

impl GeotagSettings {
    /// Parses settings from JSON text. Single quotes are accepted in place of double quotes
    /// so the value can be passed on a command line, eg. "{ 'export_step_s': 0.5 }".
    pub fn from_json_str(s: &str) -> Result<Self, crate::GeotagCoreError> {
        let normalized = s.replace('\'', "\"");
        let settings: Self = serde_json::from_str(&normalized)?;
        settings.validated()
    }

    pub fn validated(self) -> Result<Self, crate::GeotagCoreError> {
        if !(self.export_step_s > 0.0) {
            return Err(crate::GeotagCoreError::Format(format!("export_step_s must be positive, got {}", self.export_step_s)));
        }
        if !(self.blackout_margin_s >= 0.0) {
            return Err(crate::GeotagCoreError::Format(format!("blackout_margin_s must not be negative, got {}", self.blackout_margin_s)));
        }
        if self.virtual_day_start_hour > 23 {
            return Err(crate::GeotagCoreError::Format(format!("virtual_day_start_hour must be in 0..=23, got {}", self.virtual_day_start_hour)));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = GeotagSettings::from_json_str("{ 'export_step_s': 0.5 }").unwrap();
        assert_eq!(s.export_step_s, 0.5);
        assert_eq!(s.blackout_margin_s, 2.5);
        assert_eq!(s.tile_zoom, 14);
        assert_eq!(s.virtual_day_start_hour, 6);
    }

    #[test]
    fn test_invalid_step_rejected() {
        assert!(GeotagSettings::from_json_str("{ 'export_step_s': 0 }").is_err());
        assert!(GeotagSettings::from_json_str("{ 'virtual_day_start_hour': 24 }").is_err());
        assert!(GeotagSettings::from_json_str("not json").is_err());
    }
}
