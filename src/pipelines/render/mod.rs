// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame render loop
//!
//! Each step pulls the sink's current frame into the [`DrawingSurface`],
//! blends the exposure overlay and runs the active filter. The surface is
//! then the canonical visible image, and the only thing capture reads.
//!
//! ```text
//! VideoSink ──► draw ──► exposure overlay ──► filter ──► DrawingSurface
//! ```
//!
//! Steps are requested through a [`FrameScheduler`]; each step reschedules
//! before doing any work, so one bad frame never stalls the loop.

pub mod exposure;
pub mod filters;
pub mod scheduler;
pub mod surface;

pub use exposure::ExposureOverlay;
pub use filters::{FilterType, UnknownFilter};
pub use scheduler::{FrameHandle, FrameScheduler, QueuedScheduler, RefreshLoop};
pub use surface::DrawingSurface;

use crate::backends::camera::VideoSink;
use crate::media::ColorLut;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Render loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
}

/// What a single render step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Surface updated
    Rendered,
    /// Source not readable yet; surface left as is
    NotReadable,
    /// Source was readable but handed back no frame
    NoFrame,
    /// Frame buffer did not match its stated size; surface left as is
    Malformed,
    /// Handle was cancelled or superseded
    Stale,
    /// Loop is stopped
    Stopped,
}

/// Running counters for one processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub rendered: u64,
    pub skipped: u64,
    pub failed: u64,
}

pub struct FrameProcessor {
    source: Arc<dyn VideoSink>,
    scheduler: Box<dyn FrameScheduler>,
    state: LoopState,
    pending: Option<FrameHandle>,
    surface: DrawingSurface,
    exposure_ev: f32,
    filter: FilterType,
    lut: ColorLut,
    stats: FrameStats,
}

impl FrameProcessor {
    pub fn new(source: Arc<dyn VideoSink>, scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            source,
            scheduler,
            state: LoopState::Stopped,
            pending: None,
            surface: DrawingSurface::new(),
            exposure_ev: 0.0,
            filter: FilterType::Identity,
            lut: ColorLut::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Enter Running and schedule the first step; no-op if already running
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.state = LoopState::Running;
        self.pending = Some(self.scheduler.schedule());
        info!(surface = %self.surface.dimensions(), "Frame processor started");
    }

    /// Cancel the pending step and enter Stopped; idempotent
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
        if self.is_running() {
            info!(
                rendered = self.stats.rendered,
                skipped = self.stats.skipped,
                "Frame processor stopped"
            );
        }
        self.state = LoopState::Stopped;
    }

    /// Conform the surface to the source's intrinsic size
    ///
    /// Returns false when the source has no dimensions yet.
    pub fn resize(&mut self) -> bool {
        match self.source.intrinsic_size() {
            Some(size) => {
                self.surface.conform(size);
                true
            }
            None => {
                debug!("Resize skipped, source not readable");
                false
            }
        }
    }

    /// Set the simulated EV, clamped to `[-2, 2]`; returns the stored value
    pub fn set_exposure(&mut self, ev: f32) -> f32 {
        self.exposure_ev = exposure::clamp_ev(ev);
        debug!(requested = ev, stored = self.exposure_ev, "Exposure set");
        self.exposure_ev
    }

    pub fn exposure(&self) -> f32 {
        self.exposure_ev
    }

    pub fn set_filter(&mut self, filter: FilterType) {
        debug!(%filter, "Filter set");
        self.filter = filter;
    }

    /// Select a filter by name; an unknown name leaves the current filter in place
    pub fn set_filter_name(&mut self, name: &str) -> Result<(), UnknownFilter> {
        let filter = name.parse()?;
        self.set_filter(filter);
        Ok(())
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    /// Replace the LUT used by [`FilterType::Lut`]
    pub fn set_lut(&mut self, lut: ColorLut) {
        self.lut = lut;
    }

    pub fn lut(&self) -> &ColorLut {
        &self.lut
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Run the render step scheduled as `handle`
    pub fn on_frame(&mut self, handle: FrameHandle) -> FrameOutcome {
        if !self.is_running() {
            return FrameOutcome::Stopped;
        }
        if self.pending != Some(handle) {
            return FrameOutcome::Stale;
        }

        // Reschedule before any work
        self.pending = Some(self.scheduler.schedule());

        if self.source.intrinsic_size().is_none() {
            self.stats.skipped += 1;
            return FrameOutcome::NotReadable;
        }
        let Some(frame) = self.source.current_frame() else {
            self.stats.failed += 1;
            warn!("Source readable but returned no frame");
            return FrameOutcome::NoFrame;
        };

        if !self.surface.draw(&frame) {
            self.stats.failed += 1;
            warn!(
                size = %frame.dimensions(),
                bytes = frame.data.len(),
                "Frame buffer does not match its size, skipping"
            );
            return FrameOutcome::Malformed;
        }
        if let Some(overlay) = ExposureOverlay::for_ev(self.exposure_ev) {
            overlay.apply(self.surface.pixels_mut());
        }
        self.filter.apply(self.surface.pixels_mut(), &self.lut);

        self.stats.rendered += 1;
        FrameOutcome::Rendered
    }
}

impl std::fmt::Debug for FrameProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProcessor")
            .field("state", &self.state)
            .field("surface", &self.surface.dimensions())
            .field("exposure_ev", &self.exposure_ev)
            .field("filter", &self.filter)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
