use thiserror::Error;

/// Everything that can go wrong between the link field and a finished download.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid URL: {0:?}")]
    InvalidUrl(String),

    #[error("Unrecognized host: {0}")]
    UnrecognizedHost(String),

    #[error("Media extraction failed: {0}")]
    Extraction(String),

    #[error("Thumbnail conversion failed: {0}")]
    Conversion(#[from] image::ImageError),

    #[error("Thumbnail fetch failed: {0}")]
    ThumbnailFetch(#[from] reqwest::Error),

    #[error("yt-dlp executable not available: {0}")]
    MissingExecutable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse yt-dlp output: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
