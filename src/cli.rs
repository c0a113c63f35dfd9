// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the camera pipeline
//!
//! This module provides command-line functionality for:
//! - Printing the stream request sent to the camera host
//! - Capturing a still through the full render pipeline
//! - Writing an identity LUT image to start grading from

use camera_pipeline::Config;
use camera_pipeline::backends::camera::{ConstraintProfile, Dimensions, FacingMode, StreamSession};
use camera_pipeline::backends::virtual_camera::{
    FramePattern, VirtualDevices, VirtualVideoSink, load_image_as_frame,
};
use camera_pipeline::constants::stream::{BASELINE_HEIGHT, BASELINE_WIDTH};
use camera_pipeline::gallery::AssetGallery;
use camera_pipeline::media::{ColorLut, LutSource, LutTable};
use camera_pipeline::pipelines::photo::{EncodingFormat, SnapshotCapture};
use camera_pipeline::pipelines::render::{FilterType, FrameProcessor, QueuedScheduler, RefreshLoop};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Options for the `capture` command; unset values come from the config file
pub struct CaptureOptions {
    pub facing: Option<FacingMode>,
    pub frames: u64,
    pub filter: Option<FilterType>,
    pub exposure: Option<f32>,
    pub lut: Option<PathBuf>,
    pub lut_size: Option<u32>,
    pub format: Option<EncodingFormat>,
    pub quality: Option<f32>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

fn lock(processor: &Mutex<FrameProcessor>) -> MutexGuard<'_, FrameProcessor> {
    processor.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Print the request a camera would receive
pub fn print_constraints(facing: FacingMode) -> Result<(), Box<dyn std::error::Error>> {
    let request = ConstraintProfile::build(facing);
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

/// Write an identity LUT of edge `size` as an image
pub fn write_identity_lut(size: u32, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let table = LutTable::identity(size)?;
    let image = table.to_image().ok_or("Identity LUT has no pixels")?;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image.save(output)?;
    println!(
        "Identity LUT ({}x{} image, N={}) saved: {}",
        image.width(),
        image.height(),
        size,
        output.display()
    );
    Ok(())
}

/// Run the virtual camera through the render pipeline and save one capture
pub fn capture(options: CaptureOptions) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_capture(options, Config::load_or_default()))
}

async fn run_capture(
    options: CaptureOptions,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let pattern = match &options.input {
        Some(path) => FramePattern::Still(load_image_as_frame(path)?),
        None => FramePattern::Gradient {
            size: Dimensions::new(BASELINE_WIDTH, BASELINE_HEIGHT),
        },
    };

    let sink = Arc::new(VirtualVideoSink::new(pattern));
    let session = StreamSession::new(Arc::new(VirtualDevices::new()), sink.clone())
        .with_readiness_timeout(config.readiness_timeout());

    let facing = options.facing.unwrap_or(config.default_facing);
    session.start(facing).await?;
    if let Some(track) = session.active_track() {
        println!("Using camera: {}", track.label());
    }

    // LUT from the command line wins over the configured one
    let lut_settings = options
        .lut
        .clone()
        .map(|path| (path, options.lut_size))
        .or_else(|| config.lut.as_ref().map(|l| (l.path.clone(), Some(l.size))));
    let mut lut = ColorLut::new();
    if let Some((path, size)) = lut_settings {
        let size = size.unwrap_or(camera_pipeline::constants::lut::DEFAULT_SIZE);
        if let Err(e) = lut.load(&LutSource::Path(path), size).await {
            eprintln!("LUT not applied: {}", e);
        }
    }

    let queue = QueuedScheduler::new();
    let processor = Mutex::new(FrameProcessor::new(sink, Box::new(queue.clone())));
    {
        let mut p = lock(&processor);
        p.set_exposure(options.exposure.unwrap_or(config.exposure_ev));
        p.set_filter(options.filter.unwrap_or(config.filter));
        p.set_lut(lut);
        p.resize();
        p.start();
    }

    println!("Rendering {} frame(s)...", options.frames.max(1));
    RefreshLoop::new(queue, config.refresh_rate_hz)
        .run(&processor, Some(options.frames.max(1)))
        .await;

    let format = options.format.unwrap_or(config.capture_format);
    let quality = options.quality.unwrap_or(config.capture_quality);
    let pending = SnapshotCapture::new(format, quality).capture(lock(&processor).surface());
    let result = pending.await;

    lock(&processor).stop();
    session.stop();
    let result = result?;

    let mut gallery = AssetGallery::new();
    let entry = gallery.add(result);

    let output_path = match options.output {
        Some(path) => path,
        None => {
            let dir = get_default_photo_dir();
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            dir.join(format!("IMG_{}.{}", timestamp, format.extension()))
        }
    };
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output_path, entry.blob.bytes()).await?;

    println!(
        "Photo saved: {} ({}x{}, {} bytes)",
        output_path.display(),
        entry.width,
        entry.height,
        entry.blob.len()
    );
    gallery.clear();
    Ok(())
}

/// Get the default photo directory (~/Pictures/camera-pipeline)
fn get_default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("camera-pipeline")
}
