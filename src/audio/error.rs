//! Audio subsystem errors

use super::backend::{BackendError, BackendVersion};

/// Everything that can go wrong while driving an audio backend.
///
/// None of these are fatal to the host: the subsystem logs them and either
/// stays inert (startup) or skips the rest of the tick.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// The backend instance could not be created
    Create(BackendError),
    /// The runtime version query failed
    VersionQuery(BackendError),
    /// The runtime is older than the version compiled against
    VersionMismatch {
        found: BackendVersion,
        required: BackendVersion,
    },
    /// The output device query failed
    DriverQuery(BackendError),
    /// No output device is present
    NoOutputDevice,
    /// Backend initialization failed
    Init(BackendError),
    /// Global 3D settings were rejected
    Settings3d(BackendError),
    /// Per-tick update failed
    Update(BackendError),
    /// Pushing listener attributes failed
    ListenerAttributes(BackendError),
    /// Closing the backend failed
    Close(BackendError),
    /// Releasing the backend failed
    Release(BackendError),
}

impl AudioError {
    /// The underlying backend error, if the failure came from a backend call
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Create(e)
            | Self::VersionQuery(e)
            | Self::DriverQuery(e)
            | Self::Init(e)
            | Self::Settings3d(e)
            | Self::Update(e)
            | Self::ListenerAttributes(e)
            | Self::Close(e)
            | Self::Release(e) => Some(e),
            Self::VersionMismatch { .. } | Self::NoOutputDevice => None,
        }
    }

    /// Whether this error happened while bringing the backend up
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::Create(_)
                | Self::VersionQuery(_)
                | Self::VersionMismatch { .. }
                | Self::DriverQuery(_)
                | Self::NoOutputDevice
                | Self::Init(_)
                | Self::Settings3d(_)
        )
    }
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create(e) => write!(f, "Failed to create instance: {e}"),
            Self::VersionQuery(e) => write!(f, "Failed to query version: {e}"),
            Self::VersionMismatch { found, required } => write!(
                f,
                "Runtime version {found} is older than required version {required}"
            ),
            Self::DriverQuery(e) => write!(f, "Failed to query output devices: {e}"),
            Self::NoOutputDevice => write!(f, "No audio output device available"),
            Self::Init(e) => write!(f, "Failed to initialize: {e}"),
            Self::Settings3d(e) => write!(f, "Failed to apply 3D settings: {e}"),
            Self::Update(e) => write!(f, "Update failed: {e}"),
            Self::ListenerAttributes(e) => write!(f, "Failed to set listener attributes: {e}"),
            Self::Close(e) => write!(f, "Failed to close: {e}"),
            Self::Release(e) => write!(f, "Failed to release: {e}"),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.backend_error()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
