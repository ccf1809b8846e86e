// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::coordinates::{GeoCoordinate, TrackPointRecord};
use super::data::GpxTrack;
use crate::GeotagCoreError;

const GPX_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parses all `<trkpt>` elements in document order. Every point needs `lat`, `lon` and a
/// parsable `<time>`; `<ele>` is optional.
pub fn parse_gpx_from_str(s: &str, day_start_hour: u32) -> Result<GpxTrack, GeotagCoreError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(s);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut in_point = false;
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;
    let mut ele: Option<f64> = None;
    let mut time: Option<DateTime<Utc>> = None;

    let mut points: Vec<(GeoCoordinate, DateTime<Utc>)> = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)
            .map_err(|e| GeotagCoreError::Format(format!("XML error at position {}: {}", reader.buffer_position(), e)))?;
        match event {
            Event::Eof => break,
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"trkpt" => {
                        in_point = true;
                        (lat, lon) = parse_point_attributes(&e)?;
                        ele = None;
                        time = None;
                    }
                    b"ele" if in_point => {
                        let txt = reader.read_text(e.name()).map_err(xml_format_error)?;
                        ele = Some(parse_number("ele", &txt)?);
                    }
                    b"time" if in_point => {
                        let txt = reader.read_text(e.name()).map_err(xml_format_error)?;
                        time = Some(parse_gpx_time(&txt)?);
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                // <trkpt lat=".." lon=".."/> cannot carry a time
                if e.local_name().as_ref() == b"trkpt" {
                    return Err(GeotagCoreError::Format(format!("Track point #{} has no time", points.len() + 1)));
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"trkpt" {
                    in_point = false;
                    let index = points.len() + 1;
                    let (lat, lon) = match (lat, lon) {
                        (Some(lat), Some(lon)) => (lat, lon),
                        _ => return Err(GeotagCoreError::Format(format!("Track point #{} is missing lat/lon", index))),
                    };
                    let time = time.ok_or_else(|| GeotagCoreError::Format(format!("Track point #{} has no time", index)))?;
                    points.push((GeoCoordinate { lat, lon, height: ele }, time));
                }
            }
            _ => {}
        }
        buf.clear();
    }

    ::log::debug!("[gpx] Parsed {} track points", points.len());
    GpxTrack::from_points(points, day_start_hour)
}

pub fn parse_gpx_file<P: AsRef<Path>>(path: P, day_start_hour: u32) -> Result<GpxTrack, GeotagCoreError> {
    let s = fs::read_to_string(path)?;
    parse_gpx_from_str(&s, day_start_hour)
}

/// Serializes records as a single `<trk>` with one `<trkseg>`.
pub fn write_gpx<'a, I>(points: I, creator: &str) -> Result<Vec<u8>, GeotagCoreError>
where I: IntoIterator<Item = &'a TrackPointRecord> {
    use quick_xml::Writer;
    use quick_xml::events::{Event, BytesDecl, BytesStart, BytesText};

    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", creator));
    gpx.push_attribute(("xmlns", "http://www.topografix.com/GPX/1/1"));
    w.write_event(Event::Start(gpx.clone()))?;

    w.write_event(Event::Start(BytesStart::new("trk")))?;
    w.write_event(Event::Start(BytesStart::new("trkseg")))?;

    for p in points {
        let mut trkpt = BytesStart::new("trkpt");
        trkpt.push_attribute(("lat", &*format!("{}", p.lat)));
        trkpt.push_attribute(("lon", &*format!("{}", p.lon)));
        w.write_event(Event::Start(trkpt))?;

        if let Some(height) = p.ele {
            let ele = BytesStart::new("ele");
            w.write_event(Event::Start(ele.borrow()))?;
            w.write_event(Event::Text(BytesText::new(&format!("{}", height))))?;
            w.write_event(Event::End(ele.to_end()))?;
        }

        let time = BytesStart::new("time");
        w.write_event(Event::Start(time.borrow()))?;
        w.write_event(Event::Text(BytesText::new(&p.time.format(GPX_TIME_FORMAT).to_string())))?;
        w.write_event(Event::End(time.to_end()))?;

        w.write_event(Event::End(BytesStart::new("trkpt").to_end()))?;
    }

    w.write_event(Event::End(BytesStart::new("trkseg").to_end()))?;
    w.write_event(Event::End(BytesStart::new("trk").to_end()))?;
    w.write_event(Event::End(gpx.to_end()))?;

    Ok(w.into_inner())
}

pub fn save_gpx_file<'a, P, I>(path: P, points: I, creator: &str) -> Result<(), GeotagCoreError>
where P: AsRef<Path>, I: IntoIterator<Item = &'a TrackPointRecord> {
    let data = write_gpx(points, creator)?;
    fs::write(path, data)?;
    Ok(())
}

/// Accepts RFC 3339 (Z or offset) and zone-less ISO 8601, the latter read as UTC.
pub fn parse_gpx_time(txt: &str) -> Result<DateTime<Utc>, GeotagCoreError> {
    let txt = txt.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(txt) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(txt, fmt) {
            return Ok(dt.and_utc());
        }
    }
    Err(GeotagCoreError::Format(format!("Unparsable time '{}'", txt)))
}

fn parse_point_attributes(e: &quick_xml::events::BytesStart) -> Result<(Option<f64>, Option<f64>), GeotagCoreError> {
    let mut lat = None;
    let mut lon = None;
    for a in e.attributes().flatten() {
        let value = std::str::from_utf8(&a.value).unwrap_or_default();
        match a.key.local_name().as_ref() {
            b"lat" => lat = Some(parse_number("lat", value)?),
            b"lon" => lon = Some(parse_number("lon", value)?),
            _ => {}
        }
    }
    Ok((lat, lon))
}

fn parse_number(field: &str, txt: &str) -> Result<f64, GeotagCoreError> {
    txt.trim().parse::<f64>()
        .map_err(|_| GeotagCoreError::Format(format!("Invalid {} value '{}'", field, txt)))
}

fn xml_format_error(e: quick_xml::Error) -> GeotagCoreError {
    GeotagCoreError::Format(format!("XML error: {}", e))
}
