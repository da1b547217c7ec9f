use jokerforge_core::ExportReport;
use std::io;

/// A sprite sheet or image the export needs but the bundle lacks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("asset '{name}' is referenced but was not provided")]
    Missing { name: String },
    #[error("asset '{name}' has no {scale} image")]
    Incomplete { name: String, scale: &'static str },
    #[error("could not read assets: {0}")]
    Read(String),
}

impl From<io::Error> for AssetError {
    fn from(e: io::Error) -> Self {
        AssetError::Read(e.to_string())
    }
}

/// Failures while writing the archive itself.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Validation or compilation failed for at least one object.
    #[error("{0}")]
    Rejected(ExportReport),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("internal export failure: {0}")]
    Internal(#[from] InternalError),
}

impl ExportError {
    pub fn report(&self) -> Option<&ExportReport> {
        match self {
            ExportError::Rejected(report) => Some(report),
            _ => None,
        }
    }
}
