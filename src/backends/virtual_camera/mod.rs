// SPDX-License-Identifier: GPL-3.0-only

//! In-memory camera host
//!
//! Implements the camera traits without hardware so the pipeline can run
//! from the CLI and be driven deterministically in tests. Devices can be
//! scripted to refuse access, tracks to reject controls or fail to stop,
//! and the sink to delay readiness.
//!
//! ```text
//! VirtualDevices ──grant──► VirtualStream ──► VirtualTrack(s)
//!                                 │
//!                                 ▼
//!                        VirtualVideoSink ──► frames from a FramePattern
//! ```

mod file_source;
mod sink;

pub use file_source::load_image_as_frame;
pub use sink::{FramePattern, VirtualVideoSink};

use crate::backends::camera::constraints::{Constrain, ConstraintSpec};
use crate::backends::camera::types::{
    Dimensions, FacingMode, FocusMode, MediaRange, PlatformError, PlatformErrorKind,
    TrackCapabilities, TrackConstraints, TrackSettings,
};
use crate::backends::camera::{MediaDevices, MediaStream, VideoTrack};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Description of one simulated camera
#[derive(Debug, Clone)]
pub struct VirtualCameraSpec {
    pub label: String,
    pub facing: FacingMode,
    /// Largest mode the sensor supports
    pub native: Dimensions,
    pub max_frame_rate: u32,
    pub capabilities: TrackCapabilities,
    /// Video tracks handed out per stream
    pub track_count: usize,
}

impl VirtualCameraSpec {
    /// Phone-style back camera with exposure and manual focus controls
    pub fn back() -> Self {
        Self {
            label: "Virtual Back Camera".to_string(),
            facing: FacingMode::Environment,
            native: Dimensions::new(1920, 1080),
            max_frame_rate: 60,
            capabilities: TrackCapabilities {
                exposure_compensation: Some(MediaRange {
                    min: -2.0,
                    max: 2.0,
                    step: Some(1.0 / 3.0),
                }),
                focus_distance: Some(MediaRange::new(0.1, 10.0)),
                focus_modes: vec![FocusMode::Manual, FocusMode::Continuous],
            },
            track_count: 1,
        }
    }

    /// Webcam-style front camera with no adjustable controls
    pub fn front() -> Self {
        Self {
            label: "Virtual Front Camera".to_string(),
            facing: FacingMode::User,
            native: Dimensions::new(1280, 720),
            max_frame_rate: 30,
            capabilities: TrackCapabilities::default(),
            track_count: 1,
        }
    }
}

#[derive(Default)]
struct DevicesState {
    failure: Option<PlatformError>,
    requests: Vec<ConstraintSpec>,
    granted: Vec<Arc<VirtualStream>>,
}

/// Scripted camera access
pub struct VirtualDevices {
    cameras: Vec<VirtualCameraSpec>,
    grant_delay: Option<Duration>,
    state: Arc<Mutex<DevicesState>>,
}

impl VirtualDevices {
    /// A device with one back and one front camera
    pub fn new() -> Self {
        Self::with_cameras(vec![VirtualCameraSpec::back(), VirtualCameraSpec::front()])
    }

    pub fn with_cameras(cameras: Vec<VirtualCameraSpec>) -> Self {
        Self {
            cameras,
            grant_delay: None,
            state: Arc::new(Mutex::new(DevicesState::default())),
        }
    }

    /// Simulate a permission prompt that takes `delay` to answer
    pub fn with_grant_delay(mut self, delay: Duration) -> Self {
        self.grant_delay = Some(delay);
        self
    }

    /// Make every following request fail with `error`
    pub fn fail_with(&self, error: PlatformError) {
        lock(&self.state).failure = Some(error);
    }

    pub fn clear_failure(&self) {
        lock(&self.state).failure = None;
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<ConstraintSpec> {
        lock(&self.state).requests.clone()
    }

    /// Every stream granted so far, newest last
    pub fn granted_streams(&self) -> Vec<Arc<VirtualStream>> {
        lock(&self.state).granted.clone()
    }

    /// Pick the camera for a request, honouring ideal facing as a preference only
    fn select_camera(
        cameras: &[VirtualCameraSpec],
        request: &ConstraintSpec,
    ) -> Option<VirtualCameraSpec> {
        let wanted = request.video.facing_mode;
        let matching = cameras.iter().find(|c| c.facing == wanted.value());
        match wanted {
            Constrain::Exact(_) => matching.cloned(),
            Constrain::Ideal(_) => matching.or_else(|| cameras.first()).cloned(),
        }
    }
}

impl Default for VirtualDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDevices for VirtualDevices {
    fn get_user_media(
        &self,
        request: &ConstraintSpec,
    ) -> BoxFuture<'static, Result<Arc<dyn MediaStream>, PlatformError>> {
        let request = request.clone();
        let cameras = self.cameras.clone();
        let delay = self.grant_delay;
        let state = Arc::clone(&self.state);

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut guard = lock(&state);
            guard.requests.push(request.clone());
            if let Some(err) = guard.failure.clone() {
                debug!(error = %err, "Virtual device refusing request");
                return Err(err);
            }

            let Some(camera) = Self::select_camera(&cameras, &request) else {
                let kind = if cameras.is_empty() {
                    PlatformErrorKind::NotFound
                } else {
                    PlatformErrorKind::Overconstrained
                };
                return Err(PlatformError::new(kind, "no camera matches the request"));
            };

            let stream = Arc::new(VirtualStream::open(&camera, &request));
            info!(stream = %stream.id, camera = %camera.label, "Virtual stream granted");
            guard.granted.push(Arc::clone(&stream));
            Ok(stream as Arc<dyn MediaStream>)
        }
        .boxed()
    }
}

/// A granted virtual stream
pub struct VirtualStream {
    id: String,
    tracks: Vec<Arc<VirtualTrack>>,
}

impl VirtualStream {
    fn open(camera: &VirtualCameraSpec, request: &ConstraintSpec) -> Self {
        let video = &request.video;
        let settings = TrackSettings {
            width: Some(video.width.value().min(camera.native.width)),
            height: Some(video.height.value().min(camera.native.height)),
            frame_rate: Some(
                video
                    .frame_rate
                    .ideal
                    .min(video.frame_rate.max)
                    .min(camera.max_frame_rate) as f64,
            ),
            facing_mode: Some(camera.facing),
            exposure_compensation: camera.capabilities.exposure_compensation.map(|_| 0.0),
            focus_mode: camera.capabilities.focus_modes.first().copied(),
            focus_distance: None,
        };

        let tracks = (0..camera.track_count)
            .map(|i| {
                let label = if i == 0 {
                    camera.label.clone()
                } else {
                    format!("{} #{}", camera.label, i + 1)
                };
                Arc::new(VirtualTrack::new(
                    label,
                    camera.capabilities.clone(),
                    settings.clone(),
                ))
            })
            .collect();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracks,
        }
    }

    /// Concrete tracks, for inspecting what the session did to them
    pub fn virtual_tracks(&self) -> &[Arc<VirtualTrack>] {
        &self.tracks
    }
}

impl MediaStream for VirtualStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        self.tracks
            .iter()
            .map(|t| Arc::clone(t) as Arc<dyn VideoTrack>)
            .collect()
    }
}

/// A simulated video track
pub struct VirtualTrack {
    label: String,
    capabilities: TrackCapabilities,
    settings: Mutex<TrackSettings>,
    applied: Mutex<Vec<TrackConstraints>>,
    apply_failure: Mutex<Option<PlatformError>>,
    stop_failure: Mutex<Option<PlatformError>>,
    stopped: AtomicBool,
    stop_calls: AtomicUsize,
}

impl VirtualTrack {
    pub fn new(label: String, capabilities: TrackCapabilities, settings: TrackSettings) -> Self {
        Self {
            label,
            capabilities,
            settings: Mutex::new(settings),
            applied: Mutex::new(Vec::new()),
            apply_failure: Mutex::new(None),
            stop_failure: Mutex::new(None),
            stopped: AtomicBool::new(false),
            stop_calls: AtomicUsize::new(0),
        }
    }

    /// Reject every following `apply_constraints`
    pub fn fail_apply_with(&self, error: PlatformError) {
        *lock(&self.apply_failure) = Some(error);
    }

    /// Make `stop` fail without releasing the device
    pub fn fail_stop_with(&self, error: PlatformError) {
        *lock(&self.stop_failure) = Some(error);
    }

    /// Constraint sets that reached the device
    pub fn applied_constraints(&self) -> Vec<TrackConstraints> {
        lock(&self.applied).clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl VideoTrack for VirtualTrack {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn capabilities(&self) -> TrackCapabilities {
        self.capabilities.clone()
    }

    fn settings(&self) -> TrackSettings {
        lock(&self.settings).clone()
    }

    fn apply_constraints(
        &self,
        constraints: TrackConstraints,
    ) -> BoxFuture<'static, Result<(), PlatformError>> {
        let result = match lock(&self.apply_failure).clone() {
            Some(err) => Err(err),
            None => {
                let mut settings = lock(&self.settings);
                if let Some(ev) = constraints.exposure_compensation {
                    settings.exposure_compensation = Some(ev);
                }
                if let Some(mode) = constraints.focus_mode {
                    settings.focus_mode = Some(mode);
                }
                if let Some(distance) = constraints.focus_distance {
                    settings.focus_distance = Some(distance);
                }
                lock(&self.applied).push(constraints);
                Ok(())
            }
        };
        futures::future::ready(result).boxed()
    }

    fn stop(&self) -> Result<(), PlatformError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.stop_failure).clone() {
            return Err(err);
        }
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}
