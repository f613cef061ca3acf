// SPDX-License-Identifier: GPL-3.0-only

use storage_contracts::StorageError;
use storage_types::LvmNameError;
use thiserror::Error;

/// Dialog input that is rejected before anything is sent to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passphrase cannot be empty")]
    EmptyPassphrase,

    #[error("Passphrases do not match")]
    PassphraseMismatch,

    #[error("At least one disk is needed.")]
    NoDisks,

    #[error("Filesystem type cannot be empty")]
    EmptyFilesystemType,

    #[error("{0} is not supported by the storage daemon")]
    UnsupportedFilesystem(String),

    #[error("An extended partition can not be created here")]
    ExtendedNotAllowed,

    #[error("Mount point cannot be empty")]
    EmptyMountPoint,

    #[error("Mount point must start with \"/\"")]
    RelativeMountPoint,

    #[error("This logical volume cannot be made smaller.")]
    CannotShrink,

    #[error("Size cannot be zero")]
    ZeroSize,

    #[error("Size cannot be larger than {0}")]
    TooLarge(String),

    #[error("{0}")]
    InvalidName(#[from] LvmNameError),

    #[error("Name is already in use")]
    NameInUse,

    #[error("{0} needs dialog input")]
    MissingInput(&'static str),

    /// The menu item exists but is disabled; carries the reason shown with it
    #[error("{0}")]
    Unavailable(String),

    #[error("{0} is not offered for this object")]
    NotOffered(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The daemon refused the call; the message is passed on unchanged
    #[error("{}", .0.message)]
    Remote(#[from] StorageError),
}

impl DetailsError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
