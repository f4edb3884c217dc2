use thiserror::Error;

#[derive(Error, Debug)]
pub enum KinographError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Library loading error: {0}")]
    Libloading(#[from] libloading::Error),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Timeline error: {0}")]
    Timeline(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
