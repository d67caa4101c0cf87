use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Scan error: {0}")]
    Scan(#[from] core_sync::ScanError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
