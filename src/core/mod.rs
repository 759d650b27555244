//! Core engine module
//!
//! Contains the Engine, its event bus, settings and profiling

pub mod debug;
mod engine;
pub mod events;
mod settings;

pub use debug::{DebugInfo, Profiler, TimeBlock, TimingStats};
pub use engine::{Engine, EngineContext, EngineMode, Subsystem};
pub use events::{EngineEvent, EventBus, EventKind, EventQueue, Subscription};
pub use settings::{AudioConfig, Diagnostics, Settings, SettingsError};
