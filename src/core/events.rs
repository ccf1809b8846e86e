// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2025 Video Geotagger contributors

use std::sync::mpsc::Sender;

use crate::gps::GeoCoordinate;

/// State changes published by [`crate::GeotagSession`]. A presentation layer renders from these
/// and never hands UI objects to the core.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    VideoLoaded { duration_s: f64 },
    TrackLoaded { points: usize, duration_s: f64 },
    SplitPointsChanged { points: Vec<f64> },
    /// Segment list replaced, any index from an older generation is stale.
    SegmentsRebuilt { generation: u64, labels: Vec<String> },
    SegmentSelected { index: usize },
    SegmentSynchronized { index: usize, label: String },
    /// `None` hides the marker (current segment not synchronized).
    MarkerMoved { position: Option<GeoCoordinate> },
    /// Ask the player to move to a video time.
    SeekRequested { video_time_s: f64 },
}

pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

impl<F> SessionObserver for F where F: Fn(&SessionEvent) + Send + Sync {
    fn on_event(&self, event: &SessionEvent) {
        self(event)
    }
}

/// Forwards events into a channel, eg. towards a UI thread.
pub struct ChannelObserver(pub Sender<SessionEvent>);

impl SessionObserver for ChannelObserver {
    fn on_event(&self, event: &SessionEvent) {
        if self.0.send(event.clone()).is_err() {
            ::log::debug!("[events] Receiver dropped, event discarded");
        }
    }
}

pub type ObserverId = usize;

#[derive(Default)]
pub struct Observers {
    next_id: ObserverId,
    list: Vec<(ObserverId, Box<dyn SessionObserver>)>,
}

impl Observers {
    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;
        self.list.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.list.len();
        self.list.retain(|(i, _)| *i != id);
        self.list.len() != before
    }

    pub fn len(&self) -> usize { self.list.len() }
    pub fn is_empty(&self) -> bool { self.list.is_empty() }

    pub fn emit(&self, event: SessionEvent) {
        for (_, observer) in &self.list {
            observer.on_event(&event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers").field("count", &self.list.len()).finish()
    }
}
