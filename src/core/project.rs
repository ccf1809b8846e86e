// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use std::fs;
use std::path::{Path, PathBuf};

use crate::segments::SegmentState;
use crate::GeotagCoreError;

pub const PROJECT_VERSION: u32 = 1;
pub const PROJECT_EXTENSION: &str = "gtp";

/// Everything needed to restore a session. Media files are stored as plain file names
/// and resolved next to the project file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    pub version: u32,
    pub gpx_filename: String,
    pub video_filename: String,
    pub video_duration_s: Option<f64>,
    pub split_points: Vec<f64>,
    pub video_segments: Vec<SegmentState>,
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self {
            version: PROJECT_VERSION,
            gpx_filename: String::new(),
            video_filename: String::new(),
            video_duration_s: None,
            split_points: Vec::new(),
            video_segments: Vec::new(),
        }
    }
}

impl ProjectFile {
    pub fn from_json_str(s: &str) -> Result<Self, GeotagCoreError> {
        let project: Self = serde_json::from_str(s)?;
        if project.version > PROJECT_VERSION {
            ::log::warn!("[project] Project version {} is newer than supported {}", project.version, PROJECT_VERSION);
        }
        Ok(project)
    }

    pub fn to_json_string(&self) -> Result<String, GeotagCoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GeotagCoreError> {
        let s = fs::read_to_string(path.as_ref())?;
        let project = Self::from_json_str(&s)?;
        ::log::info!("[project] Loaded {} ({} split point(s))", path.as_ref().display(), project.split_points.len());
        Ok(project)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GeotagCoreError> {
        fs::write(path.as_ref(), self.to_json_string()?)?;
        ::log::info!("[project] Saved {}", path.as_ref().display());
        Ok(())
    }

    pub fn gpx_path(&self, project_path: &Path) -> PathBuf {
        resolve_next_to(project_path, &self.gpx_filename)
    }

    pub fn video_path(&self, project_path: &Path) -> PathBuf {
        resolve_next_to(project_path, &self.video_filename)
    }
}

/// Strips the directory part, projects only keep plain file names.
pub fn plain_file_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().file_name().map(|x| x.to_string_lossy().to_string()).unwrap_or_default()
}

fn resolve_next_to(project_path: &Path, file_name: &str) -> PathBuf {
    match project_path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}
