//! A small game engine runtime centred on its audio subsystem
//!
//! This crate provides:
//! - An audio subsystem driving a pluggable backend (rodio by default)
//! - Entity Component System (ECS) storage with hecs
//! - An engine frame loop with modes, an event bus and a CPU profiler
//! - RON settings

pub mod audio;
pub mod core;
pub mod ecs;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::audio::{AudioBackend, AudioState, AudioSubsystem, RodioBackend};
    pub use crate::core::{Engine, EngineContext, EngineEvent, EngineMode, EventKind, Settings};
    pub use crate::ecs::{AudioListener, Entity, Name, Transform, World};
    pub use glam::{Quat, Vec3};
}
