use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Unsupported file type: {0} (allowed: JPEG, JPG, PNG)")]
    UnsupportedMediaType(String),
    #[error("Image decoding error: {0}")]
    ImageDecode(String),
    #[error("Image encoding error: {0}")]
    ImageEncode(String),
    #[error("No processed image available, load an image first")]
    NoProcessedImage,
    #[error("Recognition error: {0}")]
    Recognition(String),
    #[error("Missing required field: {0}")]
    MissingPrimaryField(&'static str),
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
