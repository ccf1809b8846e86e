// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::{ObserverId, Observers, SessionEvent, SessionObserver};
use crate::gps::{self, Bounds2, GeoCoordinate, GpxTrack, TrackPointRecord};
use crate::project::{plain_file_name, ProjectFile};
use crate::segments::{ExportSamples, SegmentSet};
use crate::settings::GeotagSettings;
use crate::splitting::SplitPoints;
use crate::GeotagCoreError;

/// Session shared between a UI thread and workers. Rebuilds and loads take the write lock,
/// so readers never see a half replaced segment list or track.
pub type SharedSession = Arc<RwLock<GeotagSession>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapClickOutcome {
    /// The selected segment got anchored at the current video position.
    Synchronized { index: usize, gpx_time_s: f64 },
    /// A synchronized segment covers the clicked point, the video should move there.
    Seek { index: usize, video_time_s: f64 },
    /// No synchronized segment covers the clicked point.
    NoMatch,
}

/// Headless controller tying the video timeline, split points, segments and GPX track together.
#[derive(Debug, Default)]
pub struct GeotagSession {
    settings: GeotagSettings,
    track: Option<GpxTrack>,
    gpx_filename: String,
    video_filename: String,
    video_duration_s: Option<f64>,
    position_s: f64,
    split_points: SplitPoints,
    segments: SegmentSet,
    selected: Option<usize>,
    sync_armed: bool,
    observers: Observers,
}

impl GeotagSession {
    pub fn new(settings: GeotagSettings) -> Self {
        Self { settings, ..Default::default() }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn settings(&self) -> &GeotagSettings { &self.settings }
    pub fn set_settings(&mut self, settings: GeotagSettings) { self.settings = settings; }

    pub fn track(&self) -> Option<&GpxTrack> { self.track.as_ref() }
    pub fn segments(&self) -> &SegmentSet { &self.segments }
    pub fn split_points(&self) -> &SplitPoints { &self.split_points }
    pub fn video_duration(&self) -> Option<f64> { self.video_duration_s }
    pub fn position(&self) -> f64 { self.position_s }
    pub fn selected_segment(&self) -> Option<usize> { self.selected }
    pub fn is_sync_armed(&self) -> bool { self.sync_armed }
    pub fn gpx_filename(&self) -> &str { &self.gpx_filename }
    pub fn video_filename(&self) -> &str { &self.video_filename }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// A new video resets split points and starts over with one segment spanning it.
    pub fn load_video(&mut self, file_name: &str, duration_s: f64) {
        ::log::info!("[session] Video {} loaded, duration {:.3}s", file_name, duration_s);
        self.video_filename = plain_file_name(file_name);
        self.video_duration_s = Some(duration_s);
        self.position_s = 0.0;
        self.observers.emit(SessionEvent::VideoLoaded { duration_s });
        self.reset_splits();
    }

    /// Replaces the track. Segment synchronization refers to the old track and is discarded.
    pub fn set_track(&mut self, file_name: &str, track: GpxTrack) {
        let points = track.len();
        let duration_s = track.total_duration().unwrap_or(0.0);
        ::log::info!("[session] GPX {} loaded with {} points over {:.1}s", file_name, points, duration_s);
        self.track = Some(track);
        self.gpx_filename = plain_file_name(file_name);
        self.observers.emit(SessionEvent::TrackLoaded { points, duration_s });
        self.reset_splits();
    }

    /// On failure the previously loaded track stays in place.
    pub fn load_gpx_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), GeotagCoreError> {
        let track = gps::parse_gpx_file(path.as_ref(), self.settings.virtual_day_start_hour)?;
        self.set_track(&path.as_ref().to_string_lossy(), track);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Timeline and splitting
    // ------------------------------------------------------------------

    /// Position reported by the player. Selects the segment under it and moves the marker.
    pub fn set_position(&mut self, video_s: f64) {
        let duration = self.segments.total_duration();
        self.position_s = video_s.clamp(0.0, duration.max(0.0));
        let index = self.segments.index_for_video_time(self.position_s).ok();
        if index != self.selected {
            self.selected = index;
            if let Some(index) = index {
                self.observers.emit(SessionEvent::SegmentSelected { index });
            }
        }
        self.update_marker();
    }

    /// Selecting a segment moves the video to its middle.
    pub fn select_segment(&mut self, index: usize) -> Result<(), GeotagCoreError> {
        let mid = self.segments.get(index).ok_or(GeotagCoreError::SegmentIndex(index))?.mid_point();
        self.observers.emit(SessionEvent::SeekRequested { video_time_s: mid });
        self.set_position(mid);
        Ok(())
    }

    /// Adds a split at the current position. Returns false if the point was rejected.
    pub fn add_split_at_position(&mut self) -> bool {
        let duration = self.segments.total_duration();
        if !self.split_points.add(self.position_s, duration) {
            return false;
        }
        self.splits_changed();
        true
    }

    pub fn remove_split(&mut self, index: usize) -> Result<f64, GeotagCoreError> {
        let removed = self.split_points.remove(index).ok_or(GeotagCoreError::SegmentIndex(index))?;
        self.splits_changed();
        Ok(removed)
    }

    pub fn set_split_points(&mut self, points: Vec<f64>) {
        self.split_points.set(points);
        self.splits_changed();
    }

    fn reset_splits(&mut self) {
        self.split_points.reset();
        self.splits_changed();
    }

    fn splits_changed(&mut self) {
        let duration = self.video_duration_s.unwrap_or(0.0);
        self.observers.emit(SessionEvent::SplitPointsChanged { points: self.split_points.as_slice().to_vec() });
        self.segments.rebuild(self.split_points.as_slice(), duration);
        self.sync_armed = false;
        self.selected = None;
        self.observers.emit(SessionEvent::SegmentsRebuilt {
            generation: self.segments.generation(),
            labels: self.segments.labels(),
        });
        let position = self.position_s;
        self.set_position(position);
    }

    // ------------------------------------------------------------------
    // Synchronization
    // ------------------------------------------------------------------

    /// While armed, the next map click anchors the selected segment instead of seeking.
    pub fn arm_synchronization(&mut self, armed: bool) {
        self.sync_armed = armed;
    }

    pub fn synchronize_segment(&mut self, index: usize, video_s: f64, gpx_s: f64) -> Result<(), GeotagCoreError> {
        let label = self.segments.synchronize(index, video_s, gpx_s)?.label(index);
        self.observers.emit(SessionEvent::SegmentSynchronized { index, label });
        self.update_marker();
        Ok(())
    }

    pub fn clear_synchronization(&mut self, index: usize) -> Result<(), GeotagCoreError> {
        self.segments.clear_synchronization(index)?;
        self.update_marker();
        Ok(())
    }

    /// Handles a click on the map at `coordinate`.
    pub fn map_clicked(&mut self, coordinate: &GeoCoordinate) -> Result<MapClickOutcome, GeotagCoreError> {
        let gpx_time_s = match self.track.as_ref() {
            Some(track) => track.closest_time(coordinate)?,
            None => return Ok(MapClickOutcome::NoMatch),
        };

        if self.sync_armed {
            let index = match self.selected {
                Some(index) => index,
                None => self.segments.index_for_video_time(self.position_s)?,
            };
            self.synchronize_segment(index, self.position_s, gpx_time_s)?;
            self.sync_armed = false;
            return Ok(MapClickOutcome::Synchronized { index, gpx_time_s });
        }

        let found = self.segments.segment_for_gpx_time(gpx_time_s)
            .and_then(|(index, segment)| segment.video_time_for(gpx_time_s).ok().map(|v| (index, v)));
        match found {
            Some((index, video_time_s)) => {
                self.observers.emit(SessionEvent::SeekRequested { video_time_s });
                self.set_position(video_time_s);
                Ok(MapClickOutcome::Seek { index, video_time_s })
            }
            None => {
                ::log::debug!("[session] No synchronized segment for gpx time {:.3}s", gpx_time_s);
                Ok(MapClickOutcome::NoMatch)
            }
        }
    }

    /// Track position for the current video position, `None` if its segment is not synchronized.
    pub fn marker_position(&self) -> Option<GeoCoordinate> {
        let track = self.track.as_ref()?;
        let segment = self.segments.segment_for_video_time(self.position_s).ok()?;
        let gpx_s = segment.gpx_time_for(self.position_s).ok()?;
        track.position_for_time(gpx_s).ok()
    }

    fn update_marker(&self) {
        self.observers.emit(SessionEvent::MarkerMoved { position: self.marker_position() });
    }

    pub fn segment_labels(&self) -> Vec<String> {
        self.segments.labels()
    }

    pub fn all_synchronized(&self) -> bool {
        self.segments.all_synchronized()
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    pub fn export_samples(&self) -> Result<ExportSamples<'_>, GeotagCoreError> {
        let track = self.track.as_ref().ok_or(GeotagCoreError::EmptyTrack)?;
        if !self.segments.all_synchronized() {
            return Err(GeotagCoreError::NotSynchronized);
        }
        Ok(self.segments.export_samples_with_margin(track, self.settings.export_step_s, self.settings.blackout_margin_s))
    }

    /// Resampled track points with timestamps on the video timeline.
    pub fn export_track_points(&self) -> Result<Vec<TrackPointRecord>, GeotagCoreError> {
        let track = self.track.as_ref().ok_or(GeotagCoreError::EmptyTrack)?;
        self.export_samples()?
            .map(|s| Ok(s.coordinates.to_track_point(track.export_timestamp(s.video_time_s)?)))
            .collect()
    }

    pub fn export_gpx<P: AsRef<Path>>(&self, path: P) -> Result<usize, GeotagCoreError> {
        let points = self.export_track_points()?;
        gps::save_gpx_file(path.as_ref(), &points, &self.settings.creator)?;
        ::log::info!("[session] Exported {} track points to {}", points.len(), path.as_ref().display());
        Ok(points.len())
    }

    // ------------------------------------------------------------------
    // Project persistence
    // ------------------------------------------------------------------

    pub fn to_project(&self) -> ProjectFile {
        ProjectFile {
            gpx_filename: self.gpx_filename.clone(),
            video_filename: self.video_filename.clone(),
            video_duration_s: self.video_duration_s,
            split_points: self.split_points.as_slice().to_vec(),
            video_segments: self.segments.save_states(),
            ..Default::default()
        }
    }

    /// Restores splits and synchronization once the video duration is known.
    /// Nothing changes if the saved states do not fit the rebuilt segments.
    pub fn apply_project(&mut self, project: &ProjectFile, video_duration_s: f64) -> Result<(), GeotagCoreError> {
        let (split_points, segments) = self.restored_segments(project, video_duration_s)?;
        self.commit_project(project, video_duration_s, None, split_points, segments);
        Ok(())
    }

    pub fn save_project<P: AsRef<Path>>(&self, path: P) -> Result<(), GeotagCoreError> {
        self.to_project().save(path)
    }

    /// Loads the project and the GPX file next to it. The video duration comes from the
    /// player if given, otherwise from the duration recorded in the project.
    /// On failure the session keeps its previous track, video and segments.
    pub fn load_project<P: AsRef<Path>>(&mut self, path: P, video_duration_s: Option<f64>) -> Result<ProjectFile, GeotagCoreError> {
        let project = ProjectFile::load(path.as_ref())?;
        let duration = video_duration_s.or(project.video_duration_s)
            .ok_or_else(|| GeotagCoreError::Format("Video duration unknown, not stored in the project".into()))?;
        let gpx_path = project.gpx_path(path.as_ref());
        let track = gps::parse_gpx_file(&gpx_path, self.settings.virtual_day_start_hour)?;
        let (split_points, segments) = self.restored_segments(&project, duration)?;
        let track_name = gpx_path.to_string_lossy().to_string();
        self.commit_project(&project, duration, Some((track_name, track)), split_points, segments);
        Ok(project)
    }

    /// Segments for `project` built aside from the live ones.
    fn restored_segments(&self, project: &ProjectFile, video_duration_s: f64) -> Result<(SplitPoints, SegmentSet), GeotagCoreError> {
        let mut split_points = SplitPoints::default();
        split_points.set(project.split_points.clone());
        let mut segments = self.segments.clone();
        segments.rebuild(split_points.as_slice(), video_duration_s);
        segments.restore_states(&project.video_segments)?;
        Ok((split_points, segments))
    }

    fn commit_project(&mut self, project: &ProjectFile, video_duration_s: f64, track: Option<(String, GpxTrack)>,
                      split_points: SplitPoints, segments: SegmentSet) {
        if let Some((file_name, track)) = track {
            let points = track.len();
            let duration_s = track.total_duration().unwrap_or(0.0);
            ::log::info!("[session] GPX {} loaded with {} points over {:.1}s", file_name, points, duration_s);
            self.track = Some(track);
            self.gpx_filename = plain_file_name(&file_name);
            self.observers.emit(SessionEvent::TrackLoaded { points, duration_s });
        }

        ::log::info!("[session] Project restored: video {}, {} segment(s)", project.video_filename, segments.len());
        self.video_filename = plain_file_name(&project.video_filename);
        self.video_duration_s = Some(video_duration_s);
        self.position_s = 0.0;
        self.observers.emit(SessionEvent::VideoLoaded { duration_s: video_duration_s });

        self.split_points = split_points;
        self.segments = segments;
        self.sync_armed = false;
        self.selected = None;
        self.observers.emit(SessionEvent::SplitPointsChanged { points: self.split_points.as_slice().to_vec() });
        self.observers.emit(SessionEvent::SegmentsRebuilt {
            generation: self.segments.generation(),
            labels: self.segments.labels(),
        });
        for (index, segment) in self.segments.segments().iter().enumerate() {
            if segment.is_synchronized() {
                self.observers.emit(SessionEvent::SegmentSynchronized { index, label: segment.label(index) });
            }
        }
        self.set_position(0.0);
    }

    /// Tile-space bounds of the loaded track at the configured map zoom.
    pub fn track_tile_bounds(&self) -> Result<Bounds2, GeotagCoreError> {
        let track = self.track.as_ref().ok_or(GeotagCoreError::EmptyTrack)?;
        track.tile_bounding_box(self.settings.tile_zoom)
    }

    pub fn summary_json(&self) -> serde_json::Value {
        let tile_bounds = self.track_tile_bounds().ok().map(|b| serde_json::json!({
            "zoom": self.settings.tile_zoom,
            "min": [b.min.x, b.min.y],
            "max": [b.max.x, b.max.y],
        }));
        serde_json::json!({
            "video": {
                "file": self.video_filename,
                "duration_s": self.video_duration_s,
            },
            "gpx": self.track.as_ref().map(|t| t.summary_json()).unwrap_or_else(|| serde_json::json!({ "loaded": false })),
            "tile_bounds": tile_bounds,
            "split_points": self.split_points.as_slice(),
            "segments": self.segments.segments().iter().enumerate().map(|(i, s)| serde_json::json!({
                "label": s.label(i),
                "start_s": s.start(),
                "end_s": s.end(),
                "offset_s": s.offset(),
                "anchor_s": s.anchor_video_time(),
            })).collect::<Vec<_>>(),
            "all_synchronized": self.all_synchronized(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChannelObserver;
    use crate::segments::SegmentState;
    use crate::settings::DEFAULT_TILE_ZOOM;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::mpsc::{channel, Receiver};

    /// 1000 s track heading east, 0.001° longitude per second, one sample every 5 s.
    fn east_track() -> GpxTrack {
        let t0 = DateTime::parse_from_rfc3339("2024-07-14T08:30:00Z").unwrap().with_timezone(&Utc);
        let points = (0..=200).map(|i| {
            (GeoCoordinate::with_height(46.0, 7.0 + i as f64 * 0.005, 600.0), t0 + Duration::seconds(i * 5))
        }).collect();
        GpxTrack::from_points(points, 6).unwrap()
    }

    fn session_with_events() -> (GeotagSession, Receiver<SessionEvent>) {
        let (tx, rx) = channel();
        let mut session = GeotagSession::new(GeotagSettings::default());
        session.subscribe(Box::new(ChannelObserver(tx)));
        session.set_track("/tmp/east.gpx", east_track());
        session.load_video("/tmp/clip.mp4", 120.0);
        (session, rx)
    }

    fn drain(rx: &Receiver<SessionEvent>) -> Vec<SessionEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_load_video_builds_single_segment() {
        let (session, rx) = session_with_events();
        assert_eq!(session.video_filename(), "clip.mp4");
        assert_eq!(session.gpx_filename(), "east.gpx");
        assert_eq!(session.segment_labels(), vec!["Segment 01"]);
        assert_eq!(session.selected_segment(), Some(0));
        let events = drain(&rx);
        assert!(events.contains(&SessionEvent::VideoLoaded { duration_s: 120.0 }));
        assert!(events.contains(&SessionEvent::MarkerMoved { position: None }));
        assert!(events.iter().any(|e| matches!(e, SessionEvent::SegmentsRebuilt { labels, .. } if labels.len() == 1)));
    }

    #[test]
    fn test_split_and_select() {
        let (mut session, rx) = session_with_events();
        session.set_position(60.0);
        assert!(session.add_split_at_position());
        assert!(!session.add_split_at_position());
        assert_eq!(session.segment_labels(), vec!["Segment 01", "Segment 02"]);

        drain(&rx);
        session.select_segment(1).unwrap();
        assert_eq!(session.position(), 90.0);
        assert_eq!(session.selected_segment(), Some(1));
        let events = drain(&rx);
        assert_eq!(events[0], SessionEvent::SeekRequested { video_time_s: 90.0 });
        assert!(events.contains(&SessionEvent::SegmentSelected { index: 1 }));
        assert!(session.select_segment(2).is_err());

        assert_eq!(session.remove_split(0).unwrap(), 60.0);
        assert_eq!(session.segments().len(), 1);
    }

    #[test]
    fn test_map_click_synchronizes_then_seeks() {
        let (mut session, rx) = session_with_events();
        session.set_split_points(vec![60.0]);
        session.select_segment(1).unwrap();
        session.arm_synchronization(true);

        // gpx elapsed 500 s sits at lon 7.5
        let outcome = session.map_clicked(&GeoCoordinate::new(46.0001, 7.5001)).unwrap();
        assert_eq!(outcome, MapClickOutcome::Synchronized { index: 1, gpx_time_s: 500.0 });
        assert!(!session.is_sync_armed());
        assert_eq!(session.segment_labels(), vec!["Segment 01", "Segment 02 - Synced"]);
        assert!(drain(&rx).contains(&SessionEvent::SegmentSynchronized { index: 1, label: "Segment 02 - Synced".into() }));

        let marker = session.marker_position().unwrap();
        assert!((marker.lon - 7.5).abs() < 1e-9);

        // Video 100 s <-> gpx 510 s, lon 7.51
        let outcome = session.map_clicked(&GeoCoordinate::new(46.0, 7.5101)).unwrap();
        assert_eq!(outcome, MapClickOutcome::Seek { index: 1, video_time_s: 100.0 });
        assert_eq!(session.position(), 100.0);

        // Far before the synchronized span
        assert_eq!(session.map_clicked(&GeoCoordinate::new(46.0, 7.0)).unwrap(), MapClickOutcome::NoMatch);
    }

    #[test]
    fn test_export_requires_all_synchronized() {
        let (mut session, _rx) = session_with_events();
        session.set_split_points(vec![60.0]);
        session.synchronize_segment(1, 90.0, 500.0).unwrap();
        assert!(matches!(session.export_track_points(), Err(GeotagCoreError::NotSynchronized)));

        session.synchronize_segment(0, 0.0, 100.0).unwrap();
        let points = session.export_track_points().unwrap();
        // 0..=57 and 63..=119 plus the final point at 120
        assert_eq!(points.len(), 58 + 57 + 1);
        let first = &points[0];
        assert!((first.lon - 7.1).abs() < 1e-9);
        assert_eq!(first.ele, Some(600.0));
        assert_eq!(first.time.to_rfc3339(), "2024-07-14T06:00:00+00:00");
        assert_eq!(points.last().unwrap().time.to_rfc3339(), "2024-07-14T06:02:00+00:00");
    }

    #[test]
    fn test_export_without_track() {
        let mut session = GeotagSession::new(GeotagSettings::default());
        session.load_video("clip.mp4", 10.0);
        session.synchronize_segment(0, 0.0, 0.0).unwrap();
        assert!(matches!(session.export_track_points(), Err(GeotagCoreError::EmptyTrack)));
        assert_eq!(session.map_clicked(&GeoCoordinate::new(0.0, 0.0)).unwrap(), MapClickOutcome::NoMatch);
    }

    #[test]
    fn test_project_round_trip() {
        let dir = std::env::temp_dir().join(format!("geotagger_session_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let gpx_path = dir.join("east.gpx");
        let records: Vec<TrackPointRecord> = east_track().samples().iter()
            .map(|s| s.coordinates.to_track_point(s.timestamp)).collect();
        gps::save_gpx_file(&gpx_path, &records, "unit-test").unwrap();

        let mut session = GeotagSession::new(GeotagSettings::default());
        session.load_gpx_file(&gpx_path).unwrap();
        session.load_video("clip.mp4", 120.0);
        session.set_split_points(vec![45.0, 80.0]);
        session.synchronize_segment(0, 10.0, 20.0).unwrap();
        session.synchronize_segment(2, 100.0, 700.0).unwrap();
        let project_path = dir.join("trip.gtp");
        session.save_project(&project_path).unwrap();

        let mut restored = GeotagSession::new(GeotagSettings::default());
        let project = restored.load_project(&project_path, None).unwrap();
        assert_eq!(project.split_points, vec![45.0, 80.0]);
        assert_eq!(restored.video_duration(), Some(120.0));
        assert_eq!(restored.segments().segments(), session.segments().segments());
        assert_eq!(restored.track().unwrap().len(), 201);
        assert_eq!(restored.segment_labels(), vec!["Segment 01 - Synced", "Segment 02", "Segment 03 - Synced"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_gpx_load_keeps_previous_track() {
        let (mut session, _rx) = session_with_events();
        let missing = std::env::temp_dir().join("geotagger_does_not_exist.gpx");
        assert!(session.load_gpx_file(&missing).is_err());
        assert_eq!(session.track().unwrap().len(), 201);
    }

    #[test]
    fn test_shared_session_readers() {
        let (session, _rx) = session_with_events();
        let shared = session.into_shared();
        shared.write().set_split_points(vec![30.0]);
        let handles: Vec<_> = (0..4).map(|_| {
            let shared = shared.clone();
            std::thread::spawn(move || shared.read().segments().len())
        }).collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 2);
        }
    }

    #[test]
    fn test_rejected_project_leaves_session_untouched() {
        let (mut session, rx) = session_with_events();
        session.set_split_points(vec![50.0]);
        session.synchronize_segment(0, 20.0, 300.0).unwrap();
        let segments_before = session.segments().clone();
        drain(&rx);

        // Anchor at 90 s does not fit the first segment of [0, 30]
        let project = ProjectFile {
            video_filename: "new.mp4".into(),
            split_points: vec![30.0],
            video_segments: vec![
                SegmentState { is_synchronized: true, correction_offset_s: 100.0, synchronization_time_s: 90.0 },
                SegmentState::default(),
            ],
            ..Default::default()
        };
        assert!(session.apply_project(&project, 200.0).is_err());

        assert_eq!(session.segments(), &segments_before);
        assert_eq!(session.split_points().as_slice(), &[50.0]);
        assert_eq!(session.video_duration(), Some(120.0));
        assert_eq!(session.video_filename(), "clip.mp4");
        assert!(session.segments().get(0).unwrap().is_synchronized());
        assert!(drain(&rx).is_empty());

        let valid = ProjectFile {
            video_segments: vec![SegmentState::default(), SegmentState { is_synchronized: true, correction_offset_s: 100.0, synchronization_time_s: 90.0 }],
            ..project
        };
        session.apply_project(&valid, 200.0).unwrap();
        assert_eq!(session.video_filename(), "new.mp4");
        assert_eq!(session.segment_labels(), vec!["Segment 01", "Segment 02 - Synced"]);
        assert!(session.segments().generation() > segments_before.generation());
        let events = drain(&rx);
        assert!(events.contains(&SessionEvent::SegmentSynchronized { index: 1, label: "Segment 02 - Synced".into() }));
    }

    #[test]
    fn test_rejected_project_load_keeps_track() {
        let dir = std::env::temp_dir().join(format!("geotagger_bad_project_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let records: Vec<TrackPointRecord> = east_track().samples().iter().take(11)
            .map(|s| s.coordinates.to_track_point(s.timestamp)).collect();
        gps::save_gpx_file(dir.join("short.gpx"), &records, "unit-test").unwrap();
        let project = ProjectFile {
            gpx_filename: "short.gpx".into(),
            video_filename: "other.mp4".into(),
            video_duration_s: Some(60.0),
            video_segments: vec![SegmentState { is_synchronized: true, correction_offset_s: 0.0, synchronization_time_s: 75.0 }],
            ..Default::default()
        };
        let project_path = dir.join("bad.gtp");
        project.save(&project_path).unwrap();

        let (mut session, _rx) = session_with_events();
        assert!(session.load_project(&project_path, None).is_err());
        assert_eq!(session.track().unwrap().len(), 201);
        assert_eq!(session.gpx_filename(), "east.gpx");
        assert_eq!(session.video_duration(), Some(120.0));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_tile_bounds_use_configured_zoom() {
        let (mut session, _rx) = session_with_events();
        let expected = session.track().unwrap().tile_bounding_box(DEFAULT_TILE_ZOOM).unwrap();
        assert_eq!(session.track_tile_bounds().unwrap(), expected);
        assert_eq!(session.summary_json()["tile_bounds"]["zoom"], DEFAULT_TILE_ZOOM);

        session.set_settings(GeotagSettings { tile_zoom: 10, ..GeotagSettings::default() });
        let b = session.track_tile_bounds().unwrap();
        assert!((b.min.x * 16.0 - expected.min.x).abs() < 1e-6);
        assert_eq!(session.summary_json()["tile_bounds"]["zoom"], 10);

        assert!(GeotagSession::default().summary_json()["tile_bounds"].is_null());
    }
}
