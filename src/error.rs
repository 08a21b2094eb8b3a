use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Rejections raised while building a [`crate::frame::Frame`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame dimensions must be positive, got {width}x{height}")]
    ZeroArea { width: u32, height: u32 },

    #[error("RGBA buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("frame {frame_id} is {actual_width}x{actual_height}, stream is {width}x{height}")]
    DimensionMismatch {
        frame_id: u64,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

pub type Result<T> = std::result::Result<T, WatchcamError>;
