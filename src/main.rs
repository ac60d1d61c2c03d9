//! Command-line entry point.
//!
//! `cdp-capture <url> <output> [width] [format]`
//!
//! On success the output path is printed to stdout (alone, for script
//! consumption) and a `Captured WxH` summary goes to stderr. Any failure
//! prints a one-line diagnostic to stderr and exits with code 1.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cdp_capture::{CaptureOptions, CaptureSession, ImageFormat};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page URL to capture
    url: String,

    /// Output image path
    output: PathBuf,

    /// Viewport width in pixels
    #[arg(default_value_t = CaptureOptions::DEFAULT_WIDTH)]
    width: u32,

    /// Output image format: png or jpg
    #[arg(default_value = "png")]
    format: ImageFormat,
}

#[tokio::main]
async fn main() {
    // Progress and diagnostics go to stderr; stdout is reserved for the
    // output path on success.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cdp_capture=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let options = CaptureOptions::new()
        .with_width(args.width)
        .with_format(args.format);

    let session = match CaptureSession::new(options) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match session.run(&args.url, &args.output).await {
        Ok(report) => {
            println!("{}", report.path.display());
            eprintln!("Captured {}x{}", report.width, report.height);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
