mod devices;
mod tracks;

pub use devices::{DisplayCapture, MediaDevices, MediaError};
pub use tracks::{MediaConstraints, MediaStream, MediaTrack, TrackKind, VideoSource};
