//! Audio subsystem
//!
//! Drives an external audio library through the [`AudioBackend`] trait:
//! startup checks, one update per game tick, and listener sync. Mixing and
//! spatialization stay inside the backend. [`RodioBackend`] is the bundled
//! implementation.

mod backend;
mod error;
pub mod rodio_backend;
mod subsystem;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{AudioBackend, BackendError, BackendVersion, ListenerAttributes, Settings3d};
pub use error::AudioError;
pub use rodio_backend::RodioBackend;
pub use subsystem::{AudioState, AudioSubsystem, TickOutcome};
