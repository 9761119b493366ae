use std::path::PathBuf;
use thiserror::Error;

/// Coercion and storage errors. Bad data that still fits the property's
/// type contract is not an error; it is collected by the
/// [`crate::validation::Validator`] instead.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// The input does not fit the property's type contract (wrong shape,
    /// null when not allowed, malformed color or date).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Recognised input that this crate does not handle, like `hsl()`
    /// colors.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not writable")]
    PermissionDenied(PathBuf),

    /// Failures surfacing from external collaborators, i.e, the metadata
    /// loader.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PropertyError>;

impl PropertyError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied(path.into());
        }
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_io_errors_are_lifted() {
        let err = PropertyError::io(
            "/nope",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, PropertyError::PermissionDenied(_)));

        let err = PropertyError::io(
            "/nope",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, PropertyError::Io { .. }));
    }
}
