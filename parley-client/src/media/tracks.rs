use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Capture constraints for camera + microphone acquisition.
#[derive(Debug, Clone)]
pub struct MediaConstraints {
    pub width: u32,
    pub height: u32,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            audio: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Where a video track's frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSource {
    Camera,
    Display,
}

/// Cloneable handle to one local media track. Sample production belongs to
/// the device backend; the handle carries identity and the flags the session
/// mutates in place.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    source: Option<VideoSource>,
    enabled: Arc<AtomicBool>,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    pub fn audio() -> Self {
        Self::new(TrackKind::Audio, None)
    }

    pub fn video(source: VideoSource) -> Self {
        Self::new(TrackKind::Video, Some(source))
    }

    fn new(kind: TrackKind, source: Option<VideoSource>) -> Self {
        let prefix = match kind {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        };
        Self {
            id: format!("{prefix}-{}", Uuid::new_v4()),
            kind,
            source,
            enabled: Arc::new(AtomicBool::new(true)),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn source(&self) -> Option<VideoSource> {
        self.source
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flip the enabled flag in place: an immediate mute/unmute with no
    /// renegotiation. Returns the new value.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Permanently end the track.
    pub fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// The locally-owned camera + microphone pair.
#[derive(Debug, Clone, Default)]
pub struct MediaStream {
    pub audio: Option<MediaTrack>,
    pub video: Option<MediaTrack>,
}

impl MediaStream {
    pub fn tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.audio.iter().chain(self.video.iter())
    }

    pub fn stop_all(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }
}
