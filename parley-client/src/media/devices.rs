use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::media::{MediaConstraints, MediaStream, MediaTrack};

/// Failure to acquire a capture device. Surfaced to the caller as-is; the
/// session layer never retries on its own.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media permission denied")]
    PermissionDenied,

    #[error("No capture device available: {0}")]
    DeviceUnavailable(String),

    #[error("Capture backend failure: {0}")]
    Backend(String),
}

/// A display-media capture: the video track plus a signal that fires when
/// the user stops sharing through the OS chrome.
pub struct DisplayCapture {
    pub track: MediaTrack,
    pub ended: oneshot::Receiver<()>,
}

/// The capture backend seam. Hosts plug in the platform's device layer;
/// tests use a scripted implementation. Track content never passes through
/// here, only [`MediaTrack`] handles.
#[async_trait]
pub trait MediaDevices: Send {
    /// Request camera + microphone.
    async fn acquire_user_media(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaError>;

    /// Request a display capture for screen sharing.
    async fn acquire_display_media(&mut self) -> Result<DisplayCapture, MediaError>;
}
