// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageErrorKind {
    InvalidInput,
    NotFound,
    PermissionDenied,
    Conflict,
    Unsupported,
    Busy,
    Timeout,
    Unavailable,
    /// The daemon rejected the call; the message is its own
    Rejected,
    Internal,
}

impl StorageErrorKind {
    pub fn code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::NotFound => 404,
            Self::PermissionDenied => 403,
            Self::Conflict => 409,
            Self::Unsupported => 501,
            Self::Busy => 423,
            Self::Timeout => 504,
            Self::Unavailable => 503,
            Self::Rejected => 422,
            Self::Internal => 500,
        }
    }
}

/// A failed daemon call.
///
/// `Display` is the bare message so it can be shown to users as is.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Rejected, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::NotFound, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Unsupported, message)
    }

    pub fn is_unsupported(&self) -> bool {
        self.kind == StorageErrorKind::Unsupported
    }
}
