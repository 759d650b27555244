//! The contract an audio library must meet to be driven by the subsystem
//!
//! Mixing, spatialization, decoding and device handling all stay inside the
//! backend. The subsystem only sequences these calls.

use glam::Vec3;

/// Error reported by a backend call: a numeric code and a readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Backend-specific result code
    pub code: i32,
    /// Human-readable description of the code
    pub message: String,
}

impl BackendError {
    /// Create an error from a code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for BackendError {}

/// Backend version packed as `0xMMMMmmpp` (major, minor, patch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackendVersion(pub u32);

impl BackendVersion {
    /// Pack a version from its parts
    #[must_use]
    pub const fn new(major: u16, minor: u8, patch: u8) -> Self {
        Self(((major as u32) << 16) | ((minor as u32) << 8) | patch as u32)
    }

    /// Major component
    #[must_use]
    pub const fn major(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Minor component
    #[must_use]
    pub const fn minor(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Patch component
    #[must_use]
    pub const fn patch(self) -> u8 {
        self.0 as u8
    }
}

/// Formats as hex digits, `0x0002_0108` → `2.01.08`.
impl std::fmt::Display for BackendVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}.{:02x}.{:02x}", self.major(), self.minor(), self.patch())
    }
}

/// Global 3D parameters applied once after initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings3d {
    /// Doppler effect multiplier
    pub doppler_scale: f32,
    /// World units per meter
    pub distance_factor: f32,
    /// Distance rolloff multiplier
    pub rolloff_scale: f32,
}

impl Default for Settings3d {
    fn default() -> Self {
        Self {
            doppler_scale: 1.0,
            distance_factor: 1.0,
            rolloff_scale: 0.0,
        }
    }
}

/// World-space state of one listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerAttributes {
    pub position: Vec3,
    pub velocity: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for ListenerAttributes {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

/// An external audio engine instance.
///
/// Instances are produced by a factory closure handed to
/// [`AudioSubsystem::new`](super::AudioSubsystem::new); every method maps to
/// one call into the underlying library.
pub trait AudioBackend {
    /// Short name used in log messages
    const NAME: &'static str;

    /// Version this code was built against. A runtime reporting anything
    /// older is rejected.
    const COMPILED_VERSION: BackendVersion;

    /// Version of the library actually running
    fn version(&self) -> Result<BackendVersion, BackendError>;

    /// Number of available output devices
    fn driver_count(&self) -> Result<usize, BackendError>;

    /// Start the engine with room for `max_channels` concurrent voices
    fn init(&mut self, max_channels: u32) -> Result<(), BackendError>;

    /// Apply global 3D parameters
    fn set_3d_settings(&mut self, settings: Settings3d) -> Result<(), BackendError>;

    /// Advance the engine by one step
    fn update(&mut self) -> Result<(), BackendError>;

    /// Set the 3D attributes of listener `index`
    fn set_listener_attributes(
        &mut self,
        index: usize,
        attributes: &ListenerAttributes,
    ) -> Result<(), BackendError>;

    /// Stop output and free device resources. The instance may still be
    /// released afterwards.
    fn close(&mut self) -> Result<(), BackendError>;

    /// Destroy the instance
    fn release(self) -> Result<(), BackendError>;
}
