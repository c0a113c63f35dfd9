// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The media host (camera access, the video element that plays a stream,
//! the tracks inside it) is reached only through the traits below. A
//! [`StreamSession`] owns one connection made through them.
//!
//! # Architecture
//!
//! ```text
//! ConstraintProfile ──► MediaDevices::get_user_media
//!                               │
//!                               ▼
//!                         MediaStream ──► VideoTrack (controls)
//!                               │
//!                               ▼
//!                          VideoSink  ──► FrameProcessor
//! ```

pub mod constraints;
pub mod session;
pub mod types;

pub use constraints::{ConstraintProfile, ConstraintSpec};
pub use session::{SessionPhase, StreamSession};
pub use types::*;

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::watch;

/// Entry point for camera access
pub trait MediaDevices: Send + Sync {
    /// Request a stream matching `request`
    ///
    /// Resolves once the host has granted (or refused) access. The returned
    /// stream's tracks are live until stopped.
    fn get_user_media(
        &self,
        request: &ConstraintSpec,
    ) -> BoxFuture<'static, Result<Arc<dyn MediaStream>, PlatformError>>;
}

/// A live stream handed out by [`MediaDevices`]
pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;

    /// Video tracks, in host order
    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>>;
}

/// One video channel of a stream
pub trait VideoTrack: Send + Sync {
    fn label(&self) -> String;

    /// Controls this track can accept
    fn capabilities(&self) -> TrackCapabilities;

    /// Values currently in effect
    fn settings(&self) -> TrackSettings;

    /// Apply control changes; may be rejected by the device
    fn apply_constraints(
        &self,
        constraints: TrackConstraints,
    ) -> BoxFuture<'static, Result<(), PlatformError>>;

    /// Release the underlying device
    fn stop(&self) -> Result<(), PlatformError>;
}

/// The element a stream is played into and frames are read from
pub trait VideoSink: Send + Sync {
    /// Bind a stream and begin playback
    fn attach(&self, stream: Arc<dyn MediaStream>) -> Result<(), PlatformError>;

    /// Unbind the current stream, if any
    fn detach(&self);

    /// Dimensions channel; `None` until the source is readable
    fn readiness(&self) -> watch::Receiver<Option<Dimensions>>;

    /// Intrinsic size of the playing source, `None` while not readable
    fn intrinsic_size(&self) -> Option<Dimensions>;

    /// The frame currently presented, in RGBA
    fn current_frame(&self) -> Option<CameraFrame>;
}
