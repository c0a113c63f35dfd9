// SPDX-License-Identifier: GPL-3.0-only

use camera_pipeline::backends::camera::FacingMode;
use camera_pipeline::constants::lut::DEFAULT_SIZE;
use camera_pipeline::pipelines::photo::EncodingFormat;
use camera_pipeline::pipelines::render::FilterType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-pipeline")]
#[command(about = "Real-time camera frame pipeline with LUT grading and WYSIWYG capture")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stream request sent to the camera host
    Constraints {
        /// Preferred camera (user/front or environment/back)
        #[arg(short, long, default_value = "environment")]
        facing: FacingMode,
    },

    /// Render frames from the virtual camera and save a capture
    Capture {
        /// Preferred camera (default from config)
        #[arg(long)]
        facing: Option<FacingMode>,

        /// Frames to render before capturing
        #[arg(short = 'n', long, default_value = "3")]
        frames: u64,

        /// Filter: identity, grayscale, warm, cool or lut
        #[arg(short, long)]
        filter: Option<FilterType>,

        /// Simulated exposure in EV, clamped to [-2, 2]
        #[arg(short, long, allow_hyphen_values = true)]
        exposure: Option<f32>,

        /// LUT image for the `lut` filter
        #[arg(long)]
        lut: Option<PathBuf>,

        /// LUT cube edge length
        #[arg(long)]
        lut_size: Option<u32>,

        /// Output format: jpeg or png
        #[arg(long)]
        format: Option<EncodingFormat>,

        /// Lossy quality in [0, 1]
        #[arg(short, long)]
        quality: Option<f32>,

        /// Image to use as the camera feed (default: generated gradient)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file path (default: ~/Pictures/camera-pipeline/IMG_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write an identity LUT image
    LutIdentity {
        /// Cube edge length
        #[arg(short, long, default_value_t = DEFAULT_SIZE)]
        size: u32,

        /// Output image path
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_pipeline=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Constraints { facing } => cli::print_constraints(facing),
        Commands::Capture {
            facing,
            frames,
            filter,
            exposure,
            lut,
            lut_size,
            format,
            quality,
            input,
            output,
        } => cli::capture(cli::CaptureOptions {
            facing,
            frames,
            filter,
            exposure,
            lut,
            lut_size,
            format,
            quality,
            input,
            output,
        }),
        Commands::LutIdentity { size, output } => cli::write_identity_lut(size, &output),
    }
}
