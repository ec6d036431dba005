use thiserror::Error;

pub type Result<T> = std::result::Result<T, PosterError>;

#[derive(Debug, Error)]
pub enum PosterError {
    #[error("posterkit encountered a backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG decode failed: {0}")]
    PngDecode(#[from] png::DecodingError),
    #[error("PNG encode failed: {0}")]
    PngEncode(#[from] png::EncodingError),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("failed to fetch image `{src}`: {reason}")]
    Fetch { src: String, reason: String },
    #[error("surface dropped the commit callback before completing")]
    CommitDropped,
    #[error("raster export failed: {0}")]
    Export(String),
}

#[cfg(feature = "cairo")]
impl From<cairo::Error> for PosterError {
    fn from(err: cairo::Error) -> Self {
        PosterError::Backend(Box::new(err))
    }
}

#[cfg(feature = "cairo")]
impl From<cairo::BorrowError> for PosterError {
    fn from(err: cairo::BorrowError) -> Self {
        PosterError::Backend(Box::new(err))
    }
}
