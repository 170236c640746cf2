use std::path::PathBuf;

use thiserror::Error;

/// Failure classes for a conversion run. Only `MissingDependency` and
/// `Interrupted` abort the whole batch; probe and encode failures are
/// reported and the batch moves on to the next file.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{tool} not found in PATH. Install FFmpeg (which provides {tool}) and try again")]
    MissingDependency { tool: &'static str },

    #[error("Failed to probe {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    #[error("Invalid source dimensions {width}x{height}")]
    InvalidMediaDescriptor { width: u32, height: u32 },

    #[error("ffmpeg exited with status {status:?}: {detail}")]
    Encode { status: Option<i32>, detail: String },

    #[error("Interrupted by user")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
