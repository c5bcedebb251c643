// SPDX-License-Identifier: Apache-2.0
use crate::status::QdmiStatus;

/// The single error type returned by every fallible operation in this
/// workspace, from config parsing down to a single device property query.
#[derive(Debug, thiserror::Error)]
pub enum QdmiError {
    #[error("failed to load device plugin at {path}: {cause}")]
    LoadFailed { path: String, cause: String },

    #[error("required symbol `{symbol}` not found in plugin: {cause}")]
    SymbolNotFound { symbol: String, cause: String },

    #[error("operation not supported by this device")]
    NotSupported,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("operation not implemented")]
    NotImplemented,

    #[error("device ran out of memory")]
    OutOfMemory,

    #[error("fatal device or driver error: {0}")]
    Fatal(String),

    #[error("general warning: {0}")]
    WarnGeneral(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QdmiError>;

impl QdmiError {
    /// Maps a raw status code returned by a device's `QDMI_*_dev` function
    /// into an error. Must only be called with a non-success code.
    pub fn from_status(status: QdmiStatus, context: impl Into<String>) -> Self {
        let context = context.into();
        match status {
            QdmiStatus::Success => unreachable!("from_status called with Success"),
            QdmiStatus::WarnGeneral => Self::WarnGeneral(context),
            QdmiStatus::Fatal => Self::Fatal(context),
            QdmiStatus::OutOfMemory => Self::OutOfMemory,
            QdmiStatus::NotImplemented => Self::NotImplemented,
            QdmiStatus::LibNotFound => Self::LoadFailed {
                path: context,
                cause: "library not found".into(),
            },
            QdmiStatus::NotFound => Self::NotFound(context),
            QdmiStatus::OutOfRange => Self::OutOfRange(context),
            QdmiStatus::InvalidArgument => Self::InvalidArgument(context),
            QdmiStatus::PermissionDenied => Self::PermissionDenied(context),
            QdmiStatus::NotSupported => Self::NotSupported,
        }
    }

    /// The wire status code this error corresponds to. Used when an error
    /// must be reported back across an `extern "C"` boundary.
    pub fn to_status(&self) -> QdmiStatus {
        match self {
            Self::LoadFailed { .. } => QdmiStatus::LibNotFound,
            Self::SymbolNotFound { .. } => QdmiStatus::LibNotFound,
            Self::NotSupported => QdmiStatus::NotSupported,
            Self::InvalidArgument(_) => QdmiStatus::InvalidArgument,
            Self::OutOfRange(_) => QdmiStatus::OutOfRange,
            Self::NotFound(_) => QdmiStatus::NotFound,
            Self::PermissionDenied(_) => QdmiStatus::PermissionDenied,
            Self::NotImplemented => QdmiStatus::NotImplemented,
            Self::OutOfMemory => QdmiStatus::OutOfMemory,
            Self::Fatal(_) => QdmiStatus::Fatal,
            Self::WarnGeneral(_) => QdmiStatus::WarnGeneral,
            Self::Config(_) => QdmiStatus::Fatal,
            Self::Io(_) => QdmiStatus::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_error() {
        for status in [
            QdmiStatus::WarnGeneral,
            QdmiStatus::Fatal,
            QdmiStatus::OutOfMemory,
            QdmiStatus::NotImplemented,
            QdmiStatus::LibNotFound,
            QdmiStatus::NotFound,
            QdmiStatus::OutOfRange,
            QdmiStatus::InvalidArgument,
            QdmiStatus::PermissionDenied,
            QdmiStatus::NotSupported,
        ] {
            let err = QdmiError::from_status(status, "ctx");
            assert_eq!(err.to_status(), status);
        }
    }
}
