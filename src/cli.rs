// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use argh::FromArgs;
use geotagger_core::*;
use std::path::PathBuf;
use std::time::Instant;

/** Video Geotagger
Synchronize video segments with a GPX track and export a geotag track on the video timeline
*/
#[derive(FromArgs)]
pub struct Opts {
    /// GPX track file path to load
    #[argh(option, short = 'g')]
    input_gpx: Option<String>,

    /// project file to load (the GPX file is resolved next to it)
    #[argh(option, short = 'p')]
    project: Option<String>,

    /// video duration in seconds. Required unless the project stores it
    #[argh(option, short = 'd')]
    video_duration: Option<f64>,

    /// video file name recorded in the project, default: none. Not allowed with --project
    #[argh(option)]
    video_file: Option<String>,

    /// split point in seconds, can be repeated. Replaces the split points of a loaded project
    #[argh(option, short = 's')]
    split: Vec<f64>,

    /// synchronize a segment, <segment>:<video_s>:<gpx_s>, can be repeated. Eg. "1:90:500"
    #[argh(option)]
    sync: Vec<String>,

    /// export the resampled GPX track to specified path
    #[argh(option, short = 'o')]
    export_gpx: Option<String>,

    /// save the project to specified path
    #[argh(option)]
    save_project: Option<String>,

    /// settings (file or content directly), eg. "{ 'export_step_s': 0.5, 'blackout_margin_s': 2.5 }"
    #[argh(option)]
    settings: Option<String>,

    /// print session summary as JSON
    #[argh(switch)]
    info: bool,

    /// verbose logging
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// print app version
    #[argh(switch)]
    version: bool,
}

impl Opts {
    pub fn is_verbose(&self) -> bool { self.verbose }
}

fn canonical(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_relative() {
        std::fs::canonicalize(&path).unwrap_or(path)
    } else {
        path
    }
}

fn load_settings(settings: &str) -> Result<GeotagSettings, GeotagCoreError> {
    let content = if settings.trim_start().starts_with('{') {
        settings.to_string()
    } else {
        std::fs::read_to_string(canonical(settings))?
    };
    GeotagSettings::from_json_str(&content)
}

/// Parses `<segment>:<video_s>:<gpx_s>`.
fn parse_sync(value: &str) -> Result<(usize, f64, f64), GeotagCoreError> {
    let invalid = || GeotagCoreError::Format(format!("Invalid --sync value \"{}\", expected <segment>:<video_s>:<gpx_s>", value));
    let (segment, rest) = value.split_once(':').ok_or_else(invalid)?;
    let (video_s, gpx_s) = rest.split_once(':').ok_or_else(invalid)?;
    Ok((
        segment.trim().parse().map_err(|_| invalid())?,
        video_s.trim().parse().map_err(|_| invalid())?,
        gpx_s.trim().parse().map_err(|_| invalid())?,
    ))
}

/// Rejects option combinations where one would be silently ignored.
fn check_options(opts: &Opts) -> Result<(), GeotagCoreError> {
    if opts.project.is_some() && opts.video_file.is_some() {
        return Err(GeotagCoreError::Format("--video-file cannot be combined with --project, the project names its video".into()));
    }
    Ok(())
}

pub fn run(opts: Opts) -> Result<(), GeotagCoreError> {
    if opts.version {
        println!("Video Geotagger v{}", get_version());
        return Ok(());
    }
    check_options(&opts)?;

    let time = Instant::now();

    let settings = match &opts.settings {
        Some(s) if !s.is_empty() => load_settings(s)?,
        _ => GeotagSettings::default(),
    };
    let mut session = GeotagSession::new(settings);
    session.subscribe(Box::new(|e: &SessionEvent| {
        if let SessionEvent::SegmentSynchronized { label, .. } = e {
            log::info!("{}", label);
        }
    }));

    if let Some(project) = &opts.project {
        let project = session.load_project(canonical(project), opts.video_duration)?;
        log::info!("Project: {} + {}", project.video_filename, project.gpx_filename);
        if let Some(gpx) = &opts.input_gpx {
            // Replacing the track discards the restored synchronization
            session.load_gpx_file(canonical(gpx))?;
        }
    } else {
        let duration = opts.video_duration
            .ok_or_else(|| GeotagCoreError::Format("--video-duration is required without --project".into()))?;
        if let Some(gpx) = &opts.input_gpx {
            session.load_gpx_file(canonical(gpx))?;
        }
        session.load_video(opts.video_file.as_deref().unwrap_or_default(), duration);
    }

    if !opts.split.is_empty() {
        session.set_split_points(opts.split.clone());
        log::info!("Split points: {:?}", session.split_points().as_slice());
    }

    for value in &opts.sync {
        let (segment, video_s, gpx_s) = parse_sync(value)?;
        session.synchronize_segment(segment, video_s, gpx_s)?;
    }

    if opts.info {
        println!("{}", serde_json::to_string_pretty(&session.summary_json())?);
    }

    if let Some(path) = &opts.save_project {
        session.save_project(path)?;
    }

    if let Some(path) = &opts.export_gpx {
        if !session.all_synchronized() {
            let unsynced: Vec<String> = session.segment_labels().into_iter().filter(|l| !l.ends_with("Synced")).collect();
            log::error!("Not all segments are synchronized: {:?}", unsynced);
        }
        let count = session.export_gpx(path)?;
        log::info!("Exported {} points in {:.3}s", count, time.elapsed().as_secs_f64());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync() {
        assert_eq!(parse_sync("1:90:500").unwrap(), (1, 90.0, 500.0));
        assert_eq!(parse_sync(" 0 : 2.5 : 10.25").unwrap(), (0, 2.5, 10.25));
        assert!(parse_sync("1:90").is_err());
        assert!(parse_sync("a:1:2").is_err());
    }

    #[test]
    fn test_inline_settings() {
        let s = load_settings("{ 'export_step_s': 0.5 }").unwrap();
        assert_eq!(s.export_step_s, 0.5);
        assert!(load_settings("/nonexistent/settings.json").is_err());
    }

    #[test]
    fn test_opts_from_args() {
        let opts = Opts::from_args(&["video-geotagger"], &["-d", "120", "-s", "60", "--sync", "1:90:500", "--sync", "0:10:20", "--info"]).unwrap();
        assert_eq!(opts.video_duration, Some(120.0));
        assert_eq!(opts.split, vec![60.0]);
        assert_eq!(opts.sync.len(), 2);
        assert!(opts.info);
        assert!(!opts.verbose);
    }

    #[test]
    fn test_video_file_rejected_with_project() {
        let opts = Opts::from_args(&["video-geotagger"], &["-p", "trip.gtp", "--video-file", "clip.mp4"]).unwrap();
        assert!(matches!(check_options(&opts), Err(GeotagCoreError::Format(_))));
        assert!(run(opts).is_err());

        let opts = Opts::from_args(&["video-geotagger"], &["-d", "60", "--video-file", "clip.mp4"]).unwrap();
        assert!(check_options(&opts).is_ok());
    }
}
