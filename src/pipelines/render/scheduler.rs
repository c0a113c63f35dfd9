// SPDX-License-Identifier: GPL-3.0-only

//! Render step scheduling
//!
//! The frame processor never binds to a display clock directly. It asks a
//! [`FrameScheduler`] for the next step and gets back a handle; whoever drives
//! the scheduler later calls `on_frame` with that handle.

use super::FrameProcessor;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

/// Identifies one requested render step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Source of "run the next step" callbacks
pub trait FrameScheduler: Send {
    /// Request one more step
    fn schedule(&mut self) -> FrameHandle;

    /// Withdraw a step that has not run yet
    fn cancel(&mut self, handle: FrameHandle);
}

#[derive(Debug, Default)]
struct Queue {
    next_id: u64,
    pending: VecDeque<FrameHandle>,
}

/// Scheduler that just records requests
///
/// Clones share one queue: hand one clone to the processor and step it by
/// hand (tests) or through a [`RefreshLoop`].
#[derive(Debug, Clone, Default)]
pub struct QueuedScheduler {
    queue: Arc<Mutex<Queue>>,
}

impl QueuedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop the oldest pending step
    pub fn take_pending(&self) -> Option<FrameHandle> {
        self.queue().pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue().pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.queue().pending.len()
    }
}

impl FrameScheduler for QueuedScheduler {
    fn schedule(&mut self) -> FrameHandle {
        let mut queue = self.queue();
        queue.next_id += 1;
        let handle = FrameHandle(queue.next_id);
        queue.pending.push_back(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.queue().pending.retain(|h| *h != handle);
    }
}

/// Drives a processor from a [`QueuedScheduler`] at a fixed refresh rate
pub struct RefreshLoop {
    queue: QueuedScheduler,
    period: Duration,
}

impl RefreshLoop {
    pub fn new(queue: QueuedScheduler, refresh_rate_hz: u32) -> Self {
        Self {
            queue,
            period: Duration::from_nanos(1_000_000_000 / u64::from(refresh_rate_hz.max(1))),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Step the processor once per refresh until it stops scheduling
    ///
    /// With `max_frames` set, returns after that many steps even if the
    /// processor is still running. Returns the number of steps taken.
    pub async fn run(&self, processor: &Mutex<FrameProcessor>, max_frames: Option<u64>) -> u64 {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut steps = 0u64;

        info!(period_us = self.period.as_micros() as u64, ?max_frames, "Refresh loop started");

        loop {
            if max_frames.is_some_and(|max| steps >= max) {
                break;
            }
            interval.tick().await;

            let Some(handle) = self.queue.take_pending() else {
                debug!("No render step pending, processor stopped");
                break;
            };

            // Guard is dropped before the next tick is awaited
            let outcome = processor
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .on_frame(handle);
            trace!(frame = handle.id(), ?outcome, "Render step");
            steps += 1;
        }

        info!(steps, "Refresh loop finished");
        steps
    }
}
