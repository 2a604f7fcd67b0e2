use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while creating, saving or post-processing a record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required field was missing before the record was persisted
    #[error("Validation error: {0}")]
    Validation(String),

    /// The original image could not be read or decoded
    #[error("Decode error for {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    /// A resized variant could not be encoded
    #[error("Encode error for {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A directory or file could not be written to media storage
    #[error("Storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{model} {id} not found")]
    NotFound { model: &'static str, id: i64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecordError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = RecordError::Validation("Student name cannot be empty.".to_string());
        assert_eq!(err.to_string(), "Validation error: Student name cannot be empty.");
    }

    #[test]
    fn test_not_found_message() {
        let err = RecordError::NotFound { model: "Student", id: 42 };
        assert_eq!(err.to_string(), "Student 42 not found");
    }
}
