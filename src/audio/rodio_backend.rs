//! Audio backend built on rodio
//!
//! rodio is linked statically, so the runtime version always equals the
//! compiled one. Spatial voices are `SpatialSink`s whose ear positions are
//! derived from listener 0.

use std::io::Cursor;
use std::sync::Arc;

use glam::Vec3;
use rodio::cpal::traits::HostTrait;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, SpatialSink, mixer::Mixer};

use super::backend::{AudioBackend, BackendError, BackendVersion, ListenerAttributes, Settings3d};

/// Result codes reported in [`BackendError::code`]
pub mod codes {
    /// Call requires `init` first
    pub const NOT_INITIALIZED: i32 = 1;
    /// `init` called twice
    pub const ALREADY_INITIALIZED: i32 = 2;
    /// Output device could not be enumerated or opened
    pub const DEVICE: i32 = 3;
    /// Audio data could not be decoded
    pub const DECODE: i32 = 4;
    /// Every voice is in use
    pub const CHANNELS_EXHAUSTED: i32 = 5;
    /// Argument out of range
    pub const INVALID_PARAM: i32 = 6;
}

/// Distance between the ears in meters
const EAR_SPACING: f32 = 0.2;

/// Left and right ear positions for a listener.
///
/// Falls back to the X axis when `forward` and `up` are parallel.
pub fn ear_positions(listener: &ListenerAttributes, spacing: f32) -> (Vec3, Vec3) {
    let right = listener.forward.cross(listener.up).try_normalize().unwrap_or(Vec3::X);
    let offset = right * (spacing * 0.5);
    (listener.position - offset, listener.position + offset)
}

/// Wrap mono 16-bit samples in a RIFF/WAVE container that [`Decoder`] accepts
pub fn pcm16_wav(samples: &[i16], sample_rate: u32) -> Arc<[u8]> {
    let data_len = (samples.len() * 2) as u32;
    let mut bytes = Vec::with_capacity(44 + samples.len() * 2);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes.into()
}

/// rodio output stream plus the spatial voices playing on it
pub struct RodioBackend {
    /// The output stream (must be kept alive while playing)
    stream: Option<OutputStream>,
    /// The mixer for creating sinks
    mixer: Option<Mixer>,
    /// Live spatial voices
    voices: Vec<SpatialSink>,
    /// Voice limit from `init`
    max_voices: usize,
    /// Ear spacing in world units
    ear_spacing: f32,
    /// Last listener pushed
    listener: ListenerAttributes,
}

impl RodioBackend {
    /// Create an instance. No device is touched until [`init`](AudioBackend::init).
    pub fn create() -> Result<Self, BackendError> {
        Ok(Self {
            stream: None,
            mixer: None,
            voices: Vec::new(),
            max_voices: 0,
            ear_spacing: EAR_SPACING,
            listener: ListenerAttributes::default(),
        })
    }

    /// Decode `bytes` and play them from `position`.
    ///
    /// # Errors
    ///
    /// Fails if not initialized, every voice is busy, or decoding fails
    pub fn play_at(&mut self, bytes: Arc<[u8]>, position: Vec3) -> Result<(), BackendError> {
        let Some(mixer) = &self.mixer else {
            return Err(not_initialized());
        };

        self.voices.retain(|voice| !voice.empty());
        if self.voices.len() >= self.max_voices {
            return Err(BackendError::new(
                codes::CHANNELS_EXHAUSTED,
                format!("All {} voices are in use", self.max_voices),
            ));
        }

        let source = Decoder::new(Cursor::new(bytes))
            .map_err(|e| BackendError::new(codes::DECODE, e.to_string()))?;

        let (left, right) = ear_positions(&self.listener, self.ear_spacing);
        let voice = SpatialSink::connect_new(
            mixer,
            position.to_array(),
            left.to_array(),
            right.to_array(),
        );
        voice.append(source);
        self.voices.push(voice);
        Ok(())
    }

    /// Number of voices still playing
    #[must_use]
    pub fn voice_count(&self) -> usize {
        self.voices.iter().filter(|voice| !voice.empty()).count()
    }

    /// Ear spacing currently applied, in world units
    #[must_use]
    pub fn ear_spacing(&self) -> f32 {
        self.ear_spacing
    }

    fn apply_listener(&self) {
        let (left, right) = ear_positions(&self.listener, self.ear_spacing);
        for voice in &self.voices {
            voice.set_left_ear_position(left.to_array());
            voice.set_right_ear_position(right.to_array());
        }
    }
}

fn not_initialized() -> BackendError {
    BackendError::new(codes::NOT_INITIALIZED, "Backend is not initialized")
}

impl AudioBackend for RodioBackend {
    const NAME: &'static str = "rodio";
    /// Must match the exact `rodio` version pinned in `Cargo.toml`
    const COMPILED_VERSION: BackendVersion = BackendVersion::new(0x0, 0x21, 0x01);

    fn version(&self) -> Result<BackendVersion, BackendError> {
        Ok(Self::COMPILED_VERSION)
    }

    fn driver_count(&self) -> Result<usize, BackendError> {
        let devices = rodio::cpal::default_host()
            .output_devices()
            .map_err(|e| BackendError::new(codes::DEVICE, e.to_string()))?;
        Ok(devices.count())
    }

    fn init(&mut self, max_channels: u32) -> Result<(), BackendError> {
        if self.stream.is_some() {
            return Err(BackendError::new(
                codes::ALREADY_INITIALIZED,
                "Backend is already initialized",
            ));
        }
        if max_channels == 0 {
            return Err(BackendError::new(codes::INVALID_PARAM, "max_channels must be > 0"));
        }

        let stream = OutputStreamBuilder::from_default_device()
            .map_err(|e| BackendError::new(codes::DEVICE, e.to_string()))?
            .open_stream()
            .map_err(|e| BackendError::new(codes::DEVICE, e.to_string()))?;

        self.mixer = Some(stream.mixer().clone());
        self.stream = Some(stream);
        self.max_voices = max_channels as usize;
        Ok(())
    }

    fn set_3d_settings(&mut self, settings: Settings3d) -> Result<(), BackendError> {
        if settings.distance_factor.is_nan() || settings.distance_factor <= 0.0 {
            return Err(BackendError::new(
                codes::INVALID_PARAM,
                format!("Invalid distance factor {}", settings.distance_factor),
            ));
        }
        // rodio attenuates by ear distance only; doppler and rolloff are not modelled
        log::debug!(
            "rodio ignores doppler_scale={} rolloff_scale={}",
            settings.doppler_scale,
            settings.rolloff_scale
        );
        self.ear_spacing = EAR_SPACING * settings.distance_factor;
        self.apply_listener();
        Ok(())
    }

    fn update(&mut self) -> Result<(), BackendError> {
        if self.mixer.is_none() {
            return Err(not_initialized());
        }
        self.voices.retain(|voice| !voice.empty());
        Ok(())
    }

    fn set_listener_attributes(
        &mut self,
        index: usize,
        attributes: &ListenerAttributes,
    ) -> Result<(), BackendError> {
        if index != 0 {
            return Err(BackendError::new(
                codes::INVALID_PARAM,
                format!("Listener {index} out of range, only listener 0 exists"),
            ));
        }
        if self.mixer.is_none() {
            return Err(not_initialized());
        }
        self.listener = *attributes;
        self.apply_listener();
        Ok(())
    }

    fn close(&mut self) -> Result<(), BackendError> {
        for voice in self.voices.drain(..) {
            voice.stop();
        }
        self.mixer = None;
        self.stream = None;
        Ok(())
    }

    fn release(self) -> Result<(), BackendError> {
        Ok(())
    }
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend")
            .field("initialized", &self.mixer.is_some())
            .field("voices", &self.voices.len())
            .field("max_voices", &self.max_voices)
            .field("ear_spacing", &self.ear_spacing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_compiled_version() {
        let backend = RodioBackend::create().unwrap();
        assert_eq!(backend.version().unwrap().to_string(), "0.21.01");
    }

    #[test]
    fn test_ear_positions_default_listener() {
        let (left, right) = ear_positions(&ListenerAttributes::default(), 0.2);
        assert!(left.abs_diff_eq(Vec3::new(-0.1, 0.0, 0.0), 1e-6));
        assert!(right.abs_diff_eq(Vec3::new(0.1, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_ear_positions_follow_orientation() {
        let listener = ListenerAttributes {
            position: Vec3::new(1.0, 2.0, 3.0),
            forward: Vec3::Z,
            up: Vec3::Y,
            ..Default::default()
        };
        let (left, right) = ear_positions(&listener, 2.0);
        // Facing +Z, right hand points to -X
        assert!(left.abs_diff_eq(Vec3::new(2.0, 2.0, 3.0), 1e-6));
        assert!(right.abs_diff_eq(Vec3::new(0.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn test_ear_positions_degenerate_orientation() {
        let listener = ListenerAttributes {
            forward: Vec3::Y,
            up: Vec3::Y,
            ..Default::default()
        };
        let (left, right) = ear_positions(&listener, 2.0);
        assert!(left.abs_diff_eq(Vec3::NEG_X, 1e-6));
        assert!(right.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_calls_before_init_fail() {
        let mut backend = RodioBackend::create().unwrap();

        assert_eq!(backend.update().unwrap_err().code, codes::NOT_INITIALIZED);
        assert_eq!(
            backend
                .set_listener_attributes(0, &ListenerAttributes::default())
                .unwrap_err()
                .code,
            codes::NOT_INITIALIZED
        );
        assert_eq!(
            backend
                .play_at(Arc::from(Vec::new()), Vec3::ZERO)
                .unwrap_err()
                .code,
            codes::NOT_INITIALIZED
        );
    }

    #[test]
    fn test_only_listener_zero() {
        let mut backend = RodioBackend::create().unwrap();
        let err = backend
            .set_listener_attributes(1, &ListenerAttributes::default())
            .unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAM);
    }

    #[test]
    fn test_3d_settings_scale_ear_spacing() {
        let mut backend = RodioBackend::create().unwrap();
        backend
            .set_3d_settings(Settings3d {
                distance_factor: 3.0,
                ..Default::default()
            })
            .unwrap();
        assert!((backend.ear_spacing() - 0.6).abs() < 1e-6);

        let err = backend
            .set_3d_settings(Settings3d {
                distance_factor: 0.0,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAM);
    }

    #[test]
    fn test_init_rejects_zero_channels() {
        let mut backend = RodioBackend::create().unwrap();
        assert_eq!(backend.init(0).unwrap_err().code, codes::INVALID_PARAM);
    }

    fn short_wav() -> Arc<[u8]> {
        pcm16_wav(&[0, 8_000, 16_000, 8_000, 0, -8_000, -16_000, -8_000], 8_000)
    }

    /// Backend wired to a mixer nobody plays, so no device is needed
    fn backend_with_mixer(max_voices: usize) -> (RodioBackend, rodio::mixer::MixerSource) {
        let (mixer, output) = rodio::mixer::mixer(2, 8_000);
        let mut backend = RodioBackend::create().unwrap();
        backend.mixer = Some(mixer);
        backend.max_voices = max_voices;
        (backend, output)
    }

    #[test]
    fn test_play_at_caps_voices() {
        let (mut backend, _output) = backend_with_mixer(2);

        backend.play_at(short_wav(), Vec3::ZERO).unwrap();
        backend.play_at(short_wav(), Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(backend.voice_count(), 2);

        let err = backend.play_at(short_wav(), Vec3::ZERO).unwrap_err();
        assert_eq!(err.code, codes::CHANNELS_EXHAUSTED);
        assert_eq!(backend.voice_count(), 2);
    }

    #[test]
    fn test_update_prunes_finished_voices() {
        let (mut backend, mut output) = backend_with_mixer(2);
        backend.play_at(short_wav(), Vec3::ZERO).unwrap();
        backend.play_at(short_wav(), Vec3::ZERO).unwrap();

        backend.update().unwrap();
        assert_eq!(backend.voices.len(), 2);

        // Pull half a second from the mixer so both clips run to the end
        for _ in output.by_ref().take(8_000) {}
        assert_eq!(backend.voice_count(), 0);
        assert_eq!(backend.voices.len(), 2);

        backend.update().unwrap();
        assert!(backend.voices.is_empty());

        backend.play_at(short_wav(), Vec3::ZERO).unwrap();
        assert_eq!(backend.voice_count(), 1);
    }

    #[test]
    fn test_play_at_rejects_garbage() {
        let (mut backend, _output) = backend_with_mixer(2);
        let err = backend
            .play_at(Arc::from(&b"not audio"[..]), Vec3::ZERO)
            .unwrap_err();
        assert_eq!(err.code, codes::DECODE);
        assert_eq!(backend.voice_count(), 0);
    }

    #[test]
    fn test_close_and_release_without_init() {
        let mut backend = RodioBackend::create().unwrap();
        backend.close().unwrap();
        backend.release().unwrap();
    }
}
