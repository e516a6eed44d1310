use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconstructing geometry
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not loaded: {0}")]
    NotLoaded(&'static str),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Depth decoding error: {0}")]
    CoreError(#[from] panodepth_core::Error),
}
