//! Typed error taxonomy for the processing core.
//!
//! Per-file failures (decode, sampling, encode) are caught at the batch
//! boundary and reported without aborting the remaining files; configuration
//! errors abort before any file is touched.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("sample inset {inset} does not fit a {width}x{height} image")]
    InvalidSampleGeometry { width: u32, height: u32, inset: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
