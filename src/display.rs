use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::graphics::Canvas;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to write {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot present an empty {width}x{height} frame")]
    EmptyFrame { width: usize, height: usize },
}

/// Somewhere a finished frame can be shown
pub trait FrameSink {
    fn present(&mut self, canvas: &Canvas) -> Result<(), DisplayError>;
}
