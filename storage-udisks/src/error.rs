//! Error types for UDisks2 operations

use storage_contracts::{StorageError, StorageErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiskError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("D-Bus error: {0}")]
    DBusError(String),

    /// The daemon answered with an error; the text is the daemon's message
    #[error("{0}")]
    Rejected(String),

    #[error("Not supported by this version of UDisks2: {0}")]
    Unsupported(String),

    #[error("Zbus Error")]
    ZbusError(#[from] zbus::Error),
}

const UNKNOWN_METHOD: &str = "org.freedesktop.DBus.Error.UnknownMethod";
const UNKNOWN_INTERFACE: &str = "org.freedesktop.DBus.Error.UnknownInterface";

impl DiskError {
    /// Classify the error of a method call
    pub fn from_call(method: &str, error: zbus::Error) -> Self {
        match error {
            zbus::Error::MethodError(name, message, _) => {
                if name.as_str() == UNKNOWN_METHOD || name.as_str() == UNKNOWN_INTERFACE {
                    Self::Unsupported(method.to_string())
                } else {
                    Self::Rejected(message.unwrap_or_else(|| name.to_string()))
                }
            }
            zbus::Error::FDO(fdo) => match *fdo {
                zbus::fdo::Error::UnknownMethod(_) | zbus::fdo::Error::UnknownInterface(_) => {
                    Self::Unsupported(method.to_string())
                }
                other => Self::Rejected(other.to_string()),
            },
            zbus::Error::InputOutput(e) => Self::ConnectionFailed(e.to_string()),
            other => Self::DBusError(other.to_string()),
        }
    }
}

impl From<DiskError> for StorageError {
    fn from(error: DiskError) -> Self {
        let kind = match &error {
            DiskError::ConnectionFailed(_) => StorageErrorKind::Unavailable,
            DiskError::NotFound(_) => StorageErrorKind::NotFound,
            DiskError::InvalidPath(_) => StorageErrorKind::InvalidInput,
            DiskError::Rejected(_) => StorageErrorKind::Rejected,
            DiskError::Unsupported(_) => StorageErrorKind::Unsupported,
            DiskError::DBusError(_) | DiskError::ZbusError(_) => StorageErrorKind::Internal,
        };
        StorageError::new(kind, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keeps_daemon_text() {
        let error: StorageError =
            DiskError::Rejected("Error unmounting /dev/sda1: target is busy".into()).into();
        assert_eq!(error.kind, StorageErrorKind::Rejected);
        assert_eq!(error.message, "Error unmounting /dev/sda1: target is busy");
    }

    #[test]
    fn unsupported_maps_to_unsupported_kind() {
        let error: StorageError = DiskError::Unsupported("MDRaid.Delete".into()).into();
        assert!(error.is_unsupported());
    }
}
