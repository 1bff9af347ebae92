// SPDX-License-Identifier: MIT OR Apache-2.0
//! Document loading and frame-by-frame output.

use crate::settings::SamplerSettings;
use indexmap::IndexMap;
use motionkit_anim::{
    AnimationDocument, CompositionError, DocumentError, LayerId, LayerSample, TransformProperties,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Error while running the sampler
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// Bad command line
    #[error("Usage: motionkit_sampler <document.ron|document.json> [settings.ron]")]
    Usage,

    /// File could not be read
    #[error("Failed to read {path:?}: {source}")]
    Read {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Document extension is neither RON nor JSON
    #[error("Unsupported document format: {0:?}")]
    UnsupportedFormat(PathBuf),

    /// Settings file could not be parsed
    #[error("Settings error: {0}")]
    Settings(#[from] ron::error::SpannedError),

    /// Document could not be loaded
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Document hierarchy could not be composed
    #[error(transparent)]
    Composition(#[from] CompositionError),

    /// Frame record could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Output could not be written
    #[error("Output error: {0}")]
    Write(#[from] std::io::Error),
}

fn read(path: &Path) -> Result<String, SamplerError> {
    std::fs::read_to_string(path).map_err(|source| SamplerError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a document, picking the format from the file extension
pub fn load_document(path: &Path) -> Result<AnimationDocument, SamplerError> {
    let extension = path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_ascii_lowercase);

    let document = match extension.as_deref() {
        Some("ron") => AnimationDocument::from_ron(&read(path)?)?,
        Some("json") => AnimationDocument::from_json(&read(path)?)?,
        _ => return Err(SamplerError::UnsupportedFormat(path.to_path_buf())),
    };

    tracing::info!(
        "Loaded '{}': {} layers, {:.2}s at {} fps",
        document.name,
        document.layer_count(),
        document.duration,
        document.frame_rate
    );
    Ok(document)
}

/// Load settings, or defaults when no path is given
pub fn load_settings(path: Option<&Path>) -> Result<SamplerSettings, SamplerError> {
    match path {
        Some(path) => Ok(SamplerSettings::from_ron(&read(path)?)?),
        None => Ok(SamplerSettings::default()),
    }
}

/// Per-frame output line
#[derive(Serialize)]
#[serde(untagged)]
enum FrameRecord {
    World {
        frame: u32,
        time: f64,
        layers: IndexMap<LayerId, TransformProperties>,
    },
    Full {
        frame: u32,
        time: f64,
        layers: IndexMap<LayerId, LayerSample>,
    },
}

/// Sample the document and write one JSON line per frame.
///
/// Returns the number of frames written.
pub fn run(
    document: &AnimationDocument,
    settings: &SamplerSettings,
    out: &mut impl Write,
) -> Result<usize, SamplerError> {
    let mut written = 0;

    for frame in settings.frames(document) {
        let sample = document.sample_frame(frame)?;
        let record = if settings.include_local {
            FrameRecord::Full {
                frame: sample.frame,
                time: sample.time,
                layers: sample.layers,
            }
        } else {
            FrameRecord::World {
                frame: sample.frame,
                time: sample.time,
                layers: sample
                    .layers
                    .into_iter()
                    .map(|(id, layer)| (id, layer.world))
                    .collect(),
            }
        };

        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
        written += 1;
    }

    tracing::debug!("Wrote {} frames", written);
    Ok(written)
}
