use std::error::Error;
use std::io;

/// An error related to storage operations (reads, writes...).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A lock guarding the storage was poisoned by a panicking writer.
    #[error("The storage lock has been poisoned")]
    LockPoisoned,
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl From<StorageError> for io::Error {
    #[inline]
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(error) => error,
            StorageError::LockPoisoned => Self::other("The storage lock has been poisoned"),
            StorageError::Other(error) => Self::other(error),
        }
    }
}
