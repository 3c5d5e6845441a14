use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("Root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),

    #[error("Enumeration failed for {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;

impl IndexerError {
    /// Classifies a failed directory listing of `path`.
    pub fn from_listing(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::RootNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::AccessDenied(path.to_path_buf()),
            _ => Self::Enumeration {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

pub(crate) fn worker_panicked_error(name: &str) -> IndexerError {
    IndexerError::Internal(format!("{name} panicked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_errors_are_classified_by_kind() {
        let path = Path::new("/missing");
        let error = IndexerError::from_listing(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(error, IndexerError::RootNotFound(p) if p == path));

        let error =
            IndexerError::from_listing(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(error, IndexerError::AccessDenied(_)));

        let error = IndexerError::from_listing(path, io::Error::other("device gone"));
        assert!(matches!(error, IndexerError::Enumeration { .. }));
        assert!(error.to_string().contains("device gone"));
    }
}
