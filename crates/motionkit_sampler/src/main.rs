// SPDX-License-Identifier: MIT OR Apache-2.0
//! `MotionKit` sampler - prints world transforms of a layer document.
//!
//! Usage: `motionkit_sampler <document.ron|document.json> [settings.ron]`
//!
//! Each sampled frame is written to stdout as one JSON object. Logs go to
//! stderr and follow `RUST_LOG`.

mod sampler;
mod settings;

use sampler::SamplerError;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("motionkit_sampler=info,motionkit_anim=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting MotionKit sampler v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_cli() {
        tracing::error!("Sampler failed: {e}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), SamplerError> {
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let document_path = args.next().ok_or(SamplerError::Usage)?;
    let settings_path = args.next();
    if args.next().is_some() {
        return Err(SamplerError::Usage);
    }

    let settings = sampler::load_settings(settings_path.as_deref())?;
    let mut document = sampler::load_document(&document_path)?;
    settings.apply(&mut document);

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let written = sampler::run(&document, &settings, &mut out)?;
    out.flush()?;

    tracing::info!("Sampled {} frames from {:?}", written, document_path);
    Ok(())
}
