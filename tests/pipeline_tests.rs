// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests: session → render loop → capture → gallery

use camera_pipeline::backends::camera::types::{CameraFrame, Dimensions};
use camera_pipeline::backends::camera::{FacingMode, StreamSession, VideoSink};
use camera_pipeline::backends::virtual_camera::{FramePattern, VirtualDevices, VirtualVideoSink};
use camera_pipeline::errors::{BestEffort, CaptureError};
use camera_pipeline::gallery::AssetGallery;
use camera_pipeline::media::{ColorLut, LutSource, LutTable};
use camera_pipeline::pipelines::photo::{EncodingFormat, SnapshotCapture};
use camera_pipeline::pipelines::render::{
    DrawingSurface, FilterType, FrameOutcome, FrameProcessor, QueuedScheduler, RefreshLoop,
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Deterministic frame with varied channels
fn test_frame(width: u32, height: u32) -> CameraFrame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for i in 0..width * height {
        data.extend_from_slice(&[
            (i * 37 % 256) as u8,
            (i * 91 % 256) as u8,
            (i * 13 % 256) as u8,
            255,
        ]);
    }
    CameraFrame::from_rgba(width, height, data).unwrap()
}

struct Rig {
    session: StreamSession,
    sink: Arc<VirtualVideoSink>,
    processor: FrameProcessor,
    queue: QueuedScheduler,
}

async fn ready_rig(frame: CameraFrame) -> Rig {
    let sink = Arc::new(VirtualVideoSink::new(FramePattern::Still(frame)));
    let session = StreamSession::new(Arc::new(VirtualDevices::new()), sink.clone());
    session.start(FacingMode::Environment).await.unwrap();

    let queue = QueuedScheduler::new();
    let mut processor = FrameProcessor::new(sink.clone(), Box::new(queue.clone()));
    assert!(processor.resize());
    processor.start();
    Rig {
        session,
        sink,
        processor,
        queue,
    }
}

impl Rig {
    fn step(&mut self) -> FrameOutcome {
        let handle = self.queue.take_pending().expect("a step should be pending");
        self.processor.on_frame(handle)
    }
}

#[tokio::test]
async fn test_identity_render_matches_source() {
    let frame = test_frame(16, 9);
    let mut rig = ready_rig(frame.clone()).await;
    assert_eq!(rig.processor.surface().dimensions(), Dimensions::new(16, 9));

    assert_eq!(rig.step(), FrameOutcome::Rendered);
    assert_eq!(rig.processor.surface().pixels(), &frame.data[..]);
    assert!(rig.queue.has_pending());
}

#[tokio::test]
async fn test_warm_filter_bias() {
    let frame = test_frame(16, 9);
    let mut rig = ready_rig(frame.clone()).await;
    rig.processor.set_filter_name("warm").unwrap();
    rig.step();

    for (after, before) in rig
        .processor
        .surface()
        .pixels()
        .chunks_exact(4)
        .zip(frame.data.chunks_exact(4))
    {
        assert!(after[0] >= before[0]);
        assert!(after[2] <= before[2]);
        assert_eq!(after[1], before[1]);
        assert_eq!(after[3], before[3]);
    }
}

#[tokio::test]
async fn test_parameters_apply_from_next_frame() {
    let frame = test_frame(4, 4);
    let mut rig = ready_rig(frame.clone()).await;
    rig.step();
    let identity = rig.processor.surface().pixels().to_vec();

    rig.processor.set_filter(FilterType::Grayscale);
    // surface untouched until the next step
    assert_eq!(rig.processor.surface().pixels(), &identity[..]);

    rig.step();
    assert!(
        rig.processor
            .surface()
            .pixels()
            .chunks_exact(4)
            .all(|px| px[0] == px[1] && px[1] == px[2])
    );
}

#[tokio::test]
async fn test_exposure_brightens_render() {
    let frame = test_frame(8, 8);
    let mut rig = ready_rig(frame.clone()).await;
    assert_eq!(rig.processor.set_exposure(10.0), 2.0);
    rig.step();

    for (after, before) in rig
        .processor
        .surface()
        .pixels()
        .chunks_exact(4)
        .zip(frame.data.chunks_exact(4))
    {
        for c in 0..3 {
            assert!(after[c] >= before[c]);
        }
    }
}

#[tokio::test]
async fn test_frame_size_change_conforms_surface() {
    let mut rig = ready_rig(test_frame(8, 8)).await;
    rig.step();
    rig.sink.set_pattern(FramePattern::Still(test_frame(4, 2)));
    rig.step();
    assert_eq!(rig.processor.surface().dimensions(), Dimensions::new(4, 2));
}

#[tokio::test]
async fn test_session_stop_makes_steps_skip() {
    let mut rig = ready_rig(test_frame(4, 4)).await;
    rig.step();
    rig.session.stop();
    assert!(rig.sink.intrinsic_size().is_none());

    assert_eq!(rig.step(), FrameOutcome::NotReadable);
    // loop keeps going; last rendered image stays on the surface
    assert!(rig.queue.has_pending());
    assert!(!rig.processor.surface().is_empty());
    assert_eq!(rig.processor.stats().skipped, 1);
}

#[tokio::test]
async fn test_capture_is_what_was_rendered() {
    let frame = test_frame(8, 6);
    let mut rig = ready_rig(frame).await;
    rig.processor.set_filter(FilterType::Grayscale);
    rig.step();
    let rendered = rig.processor.surface().pixels().to_vec();

    let pending = SnapshotCapture::new(EncodingFormat::Png, 0.92).capture(rig.processor.surface());
    // the source moves on while the capture is encoding
    rig.sink.set_pattern(FramePattern::Solid {
        size: Dimensions::new(8, 6),
        rgba: [255, 0, 0, 255],
    });
    rig.step();

    let result = pending.await.unwrap();
    assert_eq!((result.width, result.height), (8, 6));
    let decoded = image::load_from_memory(result.blob.bytes())
        .unwrap()
        .to_rgba8();
    assert_eq!(decoded.as_raw(), &rendered);
}

#[tokio::test]
async fn test_capture_before_render_not_ready() {
    let err = SnapshotCapture::default()
        .capture(&DrawingSurface::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::NotReady { .. }));
}

#[tokio::test]
async fn test_gallery_clear_invalidates_handles() {
    let mut rig = ready_rig(test_frame(8, 8)).await;
    rig.step();

    let mut gallery = AssetGallery::new();
    let capture = SnapshotCapture::default();
    let first = gallery.add(capture.capture(rig.processor.surface()).await.unwrap());
    let second = gallery.add(capture.capture(rig.processor.surface()).await.unwrap());
    assert_eq!(gallery.get_latest(), Some(&second));
    assert_eq!(first.blob.mime_type(), "image/jpeg");

    assert_eq!(gallery.clear(), BestEffort::Applied);
    assert!(gallery.get_all().is_empty());
    assert!(gallery.get_latest().is_none());
    assert!(gallery.registry().resolve(&first.url).is_none());
    assert!(gallery.registry().resolve(&second.url).is_none());
}

#[tokio::test]
async fn test_lut_filter_end_to_end() {
    // 2-edge cube that inverts every channel
    let mut cube = Vec::new();
    for b in [255u8, 0] {
        for g in [255u8, 0] {
            for r in [255u8, 0] {
                cube.extend_from_slice(&[r, g, b, 255]);
            }
        }
    }
    let image = LutTable::from_rgba(2, &cube).unwrap().to_image().unwrap();
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, image::ImageFormat::Png).unwrap();

    let mut lut = ColorLut::new();
    lut.load(&LutSource::Bytes(Arc::from(png.into_inner())), 2)
        .await
        .unwrap();

    let frame = CameraFrame::from_rgba(2, 1, vec![0u8, 0, 255, 10, 255, 255, 0, 20]).unwrap();
    let mut rig = ready_rig(frame).await;
    rig.processor.set_lut(lut);
    rig.processor.set_filter(FilterType::Lut);
    rig.step();

    assert_eq!(rig.processor.surface().pixels(), &[255, 255, 0, 10, 0, 0, 255, 20]);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_loop_drives_processor() {
    let sink = Arc::new(VirtualVideoSink::new(FramePattern::Gradient {
        size: Dimensions::new(8, 8),
    }));
    let session = StreamSession::new(Arc::new(VirtualDevices::new()), sink.clone());
    session.start(FacingMode::Environment).await.unwrap();

    let queue = QueuedScheduler::new();
    let processor = Mutex::new(FrameProcessor::new(sink, Box::new(queue.clone())));
    processor.lock().unwrap().start();

    let refresh = RefreshLoop::new(queue.clone(), 60);
    assert_eq!(refresh.run(&processor, Some(5)).await, 5);
    assert_eq!(processor.lock().unwrap().stats().rendered, 5);

    // once stopped, the loop runs dry and returns
    processor.lock().unwrap().stop();
    assert_eq!(refresh.run(&processor, None).await, 0);
}
