use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Library root {path} is not accessible: {message}")]
    RootInaccessible { path: String, message: String },

    #[error("Directory walk failed: {0}")]
    Walk(String),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scan task failed: {0}")]
    Task(String),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

impl ScanError {
    pub fn root_inaccessible(path: &std::path::Path, message: impl ToString) -> Self {
        ScanError::RootInaccessible {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
