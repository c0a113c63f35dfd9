// SPDX-License-Identifier: GPL-3.0-only

//! Virtual video element

use super::lock;
use crate::backends::camera::types::{CameraFrame, Dimensions, PlatformError};
use crate::backends::camera::{MediaStream, VideoSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

/// What the virtual sink shows while a stream is attached
#[derive(Debug, Clone)]
pub enum FramePattern {
    /// Every pixel the same RGBA value
    Solid { size: Dimensions, rgba: [u8; 4] },
    /// Horizontal red ramp, vertical green ramp, blue drifting per frame
    Gradient { size: Dimensions },
    /// A fixed frame, e.g. loaded from an image file
    Still(CameraFrame),
}

impl FramePattern {
    pub fn size(&self) -> Dimensions {
        match self {
            FramePattern::Solid { size, .. } | FramePattern::Gradient { size } => *size,
            FramePattern::Still(frame) => frame.dimensions(),
        }
    }

    fn render(&self, sequence: u64) -> Option<CameraFrame> {
        let size = self.size();
        match self {
            FramePattern::Still(frame) => Some(frame.clone()),
            FramePattern::Solid { rgba, .. } => {
                let data: Vec<u8> = rgba
                    .iter()
                    .copied()
                    .cycle()
                    .take(size.rgba_len())
                    .collect();
                CameraFrame::from_rgba(size.width, size.height, data)
            }
            FramePattern::Gradient { .. } => {
                let w = size.width.max(1) as usize;
                let h = size.height.max(1) as usize;
                let blue = (sequence % 256) as u8;
                let mut data = Vec::with_capacity(size.rgba_len());
                for y in 0..size.height as usize {
                    for x in 0..size.width as usize {
                        data.extend_from_slice(&[
                            (x * 255 / w) as u8,
                            (y * 255 / h) as u8,
                            blue,
                            255,
                        ]);
                    }
                }
                CameraFrame::from_rgba(size.width, size.height, data)
            }
        }
    }
}

/// In-memory stand-in for the element a stream plays into
///
/// Becomes readable as soon as a stream is attached, unless built with
/// [`VirtualVideoSink::with_manual_readiness`], in which case it waits for
/// [`VirtualVideoSink::mark_ready`].
pub struct VirtualVideoSink {
    pattern: Mutex<FramePattern>,
    attached: Mutex<Option<Arc<dyn MediaStream>>>,
    dimensions: watch::Sender<Option<Dimensions>>,
    auto_ready: bool,
    sequence: AtomicU64,
}

impl VirtualVideoSink {
    pub fn new(pattern: FramePattern) -> Self {
        let (dimensions, _) = watch::channel(None);
        Self {
            pattern: Mutex::new(pattern),
            attached: Mutex::new(None),
            dimensions,
            auto_ready: true,
            sequence: AtomicU64::new(0),
        }
    }

    /// Stay unreadable after `attach` until `mark_ready` is called
    pub fn with_manual_readiness(mut self) -> Self {
        self.auto_ready = false;
        self
    }

    /// Report the pattern's dimensions if a stream is attached
    pub fn mark_ready(&self) {
        if lock(&self.attached).is_some() {
            let size = lock(&self.pattern).size();
            self.dimensions.send_replace(Some(size));
        }
    }

    /// Swap what the sink shows; takes effect on the next frame read
    pub fn set_pattern(&self, pattern: FramePattern) {
        let size = pattern.size();
        *lock(&self.pattern) = pattern;
        if self.dimensions.borrow().is_some() {
            self.dimensions.send_replace(Some(size));
        }
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.attached).is_some()
    }

    /// Id of the attached stream
    pub fn attached_stream_id(&self) -> Option<String> {
        lock(&self.attached).as_ref().map(|s| s.id().to_string())
    }
}

impl VideoSink for VirtualVideoSink {
    fn attach(&self, stream: Arc<dyn MediaStream>) -> Result<(), PlatformError> {
        debug!(stream = stream.id(), "Virtual sink attached");
        *lock(&self.attached) = Some(stream);
        if self.auto_ready {
            self.mark_ready();
        }
        Ok(())
    }

    fn detach(&self) {
        if lock(&self.attached).take().is_some() {
            debug!("Virtual sink detached");
        }
        self.dimensions.send_replace(None);
    }

    fn readiness(&self) -> watch::Receiver<Option<Dimensions>> {
        self.dimensions.subscribe()
    }

    fn intrinsic_size(&self) -> Option<Dimensions> {
        *self.dimensions.borrow()
    }

    fn current_frame(&self) -> Option<CameraFrame> {
        self.intrinsic_size()?;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        lock(&self.pattern).render(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unattached_sink_is_unreadable() {
        let sink = VirtualVideoSink::new(FramePattern::Gradient {
            size: Dimensions::new(4, 2),
        });
        assert!(sink.intrinsic_size().is_none());
        assert!(sink.current_frame().is_none());
    }

    #[test]
    fn test_solid_pattern() {
        let pattern = FramePattern::Solid {
            size: Dimensions::new(3, 2),
            rgba: [10, 20, 30, 255],
        };
        let frame = pattern.render(0).unwrap();
        assert_eq!(frame.data.len(), 24);
        assert!(frame.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
    }

    #[test]
    fn test_gradient_pattern_ramps() {
        let frame = FramePattern::Gradient {
            size: Dimensions::new(4, 4),
        }
        .render(7)
        .unwrap();
        // top-left and bottom-right corners
        assert_eq!(&frame.data[0..4], &[0, 0, 7, 255]);
        let last = frame.data.len() - 4;
        assert_eq!(&frame.data[last..], &[191, 191, 7, 255]);
    }
}
