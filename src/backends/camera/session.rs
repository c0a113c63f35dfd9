// SPDX-License-Identifier: GPL-3.0-only

//! Camera stream lifecycle
//!
//! A [`StreamSession`] owns at most one live stream and its video track.
//! The track handle only exists while the session is `Ready`; the state enum
//! carries it so no other phase can observe one.
//!
//! ```text
//! Idle ──start──► Acquiring ──sink readable──► Ready
//!  ▲                  │                          │
//!  └──── failure ─────┘          stop            ▼
//!                     └────────── stop ──────► Stopped (restartable)
//! ```

use super::constraints::ConstraintProfile;
use super::types::{Dimensions, FacingMode, FocusMode, TrackConstraints};
use super::{MediaDevices, MediaStream, VideoSink, VideoTrack};
use crate::constants::DEFAULT_READINESS_TIMEOUT;
use crate::errors::{AcquisitionError, BestEffort, SessionError, SkipReason};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Observable session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Acquiring,
    Ready,
    Stopped,
}

enum SessionState {
    Idle,
    Acquiring {
        attempt: u64,
        cancel: watch::Sender<bool>,
    },
    Ready {
        stream: Arc<dyn MediaStream>,
        track: Arc<dyn VideoTrack>,
    },
    Stopped,
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Acquiring { .. } => SessionPhase::Acquiring,
            SessionState::Ready { .. } => SessionPhase::Ready,
            SessionState::Stopped => SessionPhase::Stopped,
        }
    }
}

struct SessionInner {
    state: SessionState,
    next_attempt: u64,
}

impl SessionInner {
    fn is_attempt(&self, attempt: u64) -> bool {
        matches!(
            &self.state,
            SessionState::Acquiring { attempt: current, .. } if *current == attempt
        )
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let SessionState::Ready { stream, .. } = &self.state {
            debug!(stream = stream.id(), "Session dropped while ready, releasing tracks");
            release_tracks(stream.as_ref());
        }
    }
}

enum Readiness {
    Ready(Dimensions),
    Closed,
    TimedOut,
    Cancelled,
}

/// Owner of one camera connection
///
/// Cloning yields another handle to the same session, so `stop` can be
/// called while a `start` on another handle is still in flight.
#[derive(Clone)]
pub struct StreamSession {
    devices: Arc<dyn MediaDevices>,
    sink: Arc<dyn VideoSink>,
    readiness_timeout: Duration,
    inner: Arc<Mutex<SessionInner>>,
}

impl StreamSession {
    pub fn new(devices: Arc<dyn MediaDevices>, sink: Arc<dyn VideoSink>) -> Self {
        Self {
            devices,
            sink,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Idle,
                next_attempt: 0,
            })),
        }
    }

    /// Bound how long `start` waits for the sink to become readable
    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().state.phase()
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == SessionPhase::Ready
    }

    /// The sink this session plays into
    pub fn sink(&self) -> Arc<dyn VideoSink> {
        Arc::clone(&self.sink)
    }

    /// The active video track; `Some` exactly when the session is ready
    pub fn active_track(&self) -> Option<Arc<dyn VideoTrack>> {
        match &self.lock().state {
            SessionState::Ready { track, .. } => Some(Arc::clone(track)),
            _ => None,
        }
    }

    /// Acquire a camera and wait until its frames are readable
    ///
    /// Does nothing if the session is already ready or acquiring. On any
    /// failure every acquired track is released and the session returns
    /// to idle.
    pub async fn start(&self, facing: FacingMode) -> Result<(), SessionError> {
        let (attempt, mut cancelled) = {
            let mut inner = self.lock();
            match inner.state.phase() {
                SessionPhase::Ready | SessionPhase::Acquiring => {
                    debug!(phase = ?inner.state.phase(), "Start ignored, session already active");
                    return Ok(());
                }
                SessionPhase::Idle | SessionPhase::Stopped => {}
            }
            inner.next_attempt += 1;
            let attempt = inner.next_attempt;
            let (cancel, cancelled) = watch::channel(false);
            inner.state = SessionState::Acquiring { attempt, cancel };
            (attempt, cancelled)
        };

        let request = ConstraintProfile::build(facing);
        info!(%facing, attempt, "Requesting camera stream");

        // The host request runs to completion even if stop() arrives meanwhile,
        // so a late grant is still released below instead of leaking.
        let stream = match self.devices.get_user_media(&request).await {
            Ok(stream) => stream,
            Err(err) => {
                let classified = AcquisitionError::from(&err);
                warn!(error = %err, classified = %classified, "Camera acquisition failed");
                self.abandon(attempt);
                return Err(classified.into());
            }
        };

        if *cancelled.borrow() {
            debug!(stream = stream.id(), "Stream granted after stop, discarding");
            release_tracks(stream.as_ref());
            return Err(SessionError::Cancelled);
        }

        let Some(track) = stream.video_tracks().into_iter().next() else {
            warn!(stream = stream.id(), "Granted stream has no video track");
            release_tracks(stream.as_ref());
            self.abandon(attempt);
            return Err(AcquisitionError::NoDevice("stream has no video track".into()).into());
        };

        if let Err(err) = self.sink.attach(Arc::clone(&stream)) {
            warn!(error = %err, "Failed to bind stream to video sink");
            release_tracks(stream.as_ref());
            self.abandon(attempt);
            return Err(AcquisitionError::from(&err).into());
        }

        let mut readiness = self.sink.readiness();
        let outcome = tokio::select! {
            waited = tokio::time::timeout(
                self.readiness_timeout,
                readiness.wait_for(|dims| dims.is_some_and(|d| !d.is_empty())),
            ) => match waited {
                Ok(Ok(dims)) => match *dims {
                    Some(dims) => Readiness::Ready(dims),
                    None => Readiness::Closed,
                },
                Ok(Err(_)) => Readiness::Closed,
                Err(_) => Readiness::TimedOut,
            },
            _ = cancelled.wait_for(|stop| *stop) => Readiness::Cancelled,
        };

        let dims = match outcome {
            Readiness::Ready(dims) => dims,
            Readiness::Cancelled => {
                debug!(attempt, "Start cancelled while waiting for readiness");
                self.discard(attempt, stream.as_ref());
                return Err(SessionError::Cancelled);
            }
            Readiness::TimedOut => {
                warn!(timeout = ?self.readiness_timeout, "Video sink never became readable");
                self.discard(attempt, stream.as_ref());
                self.abandon(attempt);
                return Err(SessionError::ReadinessTimeout(self.readiness_timeout));
            }
            Readiness::Closed => {
                warn!("Video sink closed before becoming readable");
                self.discard(attempt, stream.as_ref());
                self.abandon(attempt);
                return Err(AcquisitionError::Other("video sink closed".into()).into());
            }
        };

        {
            let mut inner = self.lock();
            if inner.is_attempt(attempt) {
                info!(
                    stream = stream.id(),
                    track = %track.label(),
                    %dims,
                    "Camera stream ready"
                );
                inner.state = SessionState::Ready { stream, track };
                return Ok(());
            }
        }

        self.discard(attempt, stream.as_ref());
        Err(SessionError::Cancelled)
    }

    /// Release the camera
    ///
    /// Never fails. Every track is stopped even if stopping an earlier one
    /// fails; such failures are reported as [`BestEffort::Ignored`].
    pub fn stop(&self) -> BestEffort {
        let previous = {
            let mut inner = self.lock();
            match inner.state.phase() {
                SessionPhase::Idle | SessionPhase::Stopped => {
                    return BestEffort::Skipped(SkipReason::AlreadyStopped);
                }
                SessionPhase::Acquiring | SessionPhase::Ready => {
                    std::mem::replace(&mut inner.state, SessionState::Stopped)
                }
            }
        };

        match previous {
            SessionState::Acquiring { attempt, cancel } => {
                info!(attempt, "Stopping session during acquisition");
                cancel.send_replace(true);
                BestEffort::Applied
            }
            SessionState::Ready { stream, .. } => {
                info!(stream = stream.id(), "Stopping camera stream");
                let failures = release_tracks(stream.as_ref());
                self.sink.detach();
                if failures.is_empty() {
                    BestEffort::Applied
                } else {
                    BestEffort::Ignored(failures.join("; "))
                }
            }
            SessionState::Idle | SessionState::Stopped => {
                BestEffort::Skipped(SkipReason::AlreadyStopped)
            }
        }
    }

    /// Set hardware exposure compensation
    ///
    /// Clamped into the track's reported range; skipped when the session is
    /// not ready, the track has no such control, or the value is already set.
    pub async fn set_exposure(&self, value: f64) -> BestEffort {
        let Some(track) = self.active_track() else {
            return BestEffort::Skipped(SkipReason::NotReady);
        };
        let Some(range) = track.capabilities().exposure_compensation() else {
            debug!(track = %track.label(), "Track has no exposure compensation control");
            return BestEffort::Skipped(SkipReason::Unsupported);
        };
        if !value.is_finite() {
            return BestEffort::Ignored(format!("non-finite exposure value {}", value));
        }

        let target = range.clamp(value);
        if track
            .settings()
            .exposure_compensation
            .is_some_and(|current| (current - target).abs() < f64::EPSILON)
        {
            return BestEffort::Skipped(SkipReason::Unchanged);
        }

        let constraints = TrackConstraints {
            exposure_compensation: Some(target),
            ..Default::default()
        };
        match track.apply_constraints(constraints).await {
            Ok(()) => {
                debug!(requested = value, applied = target, "Exposure compensation set");
                BestEffort::Applied
            }
            Err(err) => {
                warn!(error = %err, "Failed to set exposure compensation");
                BestEffort::Ignored(err.to_string())
            }
        }
    }

    /// Set manual focus, `normalized` 0 = nearest, 1 = farthest supported
    pub async fn set_focus(&self, normalized: f64) -> BestEffort {
        let Some(track) = self.active_track() else {
            return BestEffort::Skipped(SkipReason::NotReady);
        };
        let Some(range) = track.capabilities().manual_focus() else {
            debug!(track = %track.label(), "Track has no manual focus control");
            return BestEffort::Skipped(SkipReason::Unsupported);
        };
        if !normalized.is_finite() {
            return BestEffort::Ignored(format!("non-finite focus value {}", normalized));
        }

        let distance = range.lerp(normalized);
        let constraints = TrackConstraints {
            focus_mode: Some(FocusMode::Manual),
            focus_distance: Some(distance),
            ..Default::default()
        };
        match track.apply_constraints(constraints).await {
            Ok(()) => {
                debug!(normalized, distance, "Manual focus set");
                BestEffort::Applied
            }
            Err(err) => {
                warn!(error = %err, "Failed to set manual focus");
                BestEffort::Ignored(err.to_string())
            }
        }
    }

    /// Return to idle if `attempt` is still the one in progress
    fn abandon(&self, attempt: u64) {
        let mut inner = self.lock();
        if inner.is_attempt(attempt) {
            inner.state = SessionState::Idle;
        }
    }

    /// Release a failed attempt's tracks and unbind the sink
    ///
    /// The sink is shared across attempts: once `stop` and a newer `start`
    /// have run, it plays the newer stream and is left bound.
    fn discard(&self, attempt: u64, stream: &dyn MediaStream) {
        release_tracks(stream);

        // Held across detach so a newer attempt cannot claim the sink in between
        let inner = self.lock();
        let superseded = match &inner.state {
            SessionState::Acquiring { attempt: current, .. } => *current != attempt,
            SessionState::Ready { .. } => true,
            SessionState::Idle | SessionState::Stopped => false,
        };
        if superseded {
            debug!(attempt, "Newer attempt owns the video sink, leaving it bound");
        } else {
            self.sink.detach();
        }
    }
}

/// Stop every track of `stream`, collecting failures instead of raising them
fn release_tracks(stream: &dyn MediaStream) -> Vec<String> {
    let mut failures = Vec::new();
    for track in stream.video_tracks() {
        if let Err(err) = track.stop() {
            warn!(track = %track.label(), error = %err, "Failed to stop track, continuing");
            failures.push(err.to_string());
        }
    }
    failures
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("phase", &self.phase())
            .field("readiness_timeout", &self.readiness_timeout)
            .finish()
    }
}
