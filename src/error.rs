// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for the viewer core

use thiserror::Error;

/// Errors surfaced by ingestion and the scene owner.
///
/// `UnsupportedFormat`, `ParseError` and `EmptyGeometry` are user-facing and
/// never mutate the displayed model. `InvalidContext` is a programming error
/// in a collaborator (a node handle that is not part of the scene).
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse {format} data: {message}")]
    ParseError { format: String, message: String },

    #[error("model contains no usable geometry")]
    EmptyGeometry,

    #[error("invalid viewer context: {0}")]
    InvalidContext(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    pub fn parse(format: impl Into<String>, message: impl ToString) -> Self {
        Self::ParseError {
            format: format.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error should be shown to the user as a failed load.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_) | Self::ParseError { .. } | Self::EmptyGeometry | Self::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ViewerError::parse("stl", "truncated header");
        assert_eq!(err.to_string(), "failed to parse stl data: truncated header");
        assert!(err.is_user_facing());

        let err = ViewerError::InvalidContext("node 7 is not in the scene".into());
        assert!(!err.is_user_facing());
    }
}
