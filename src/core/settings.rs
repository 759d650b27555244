//! Engine settings
//!
//! Settings are saved and loaded in RON (Rusty Object Notation) format, with
//! JSON export for tooling.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Audio subsystem configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Create an audio backend at all
    pub enabled: bool,
    /// Maximum number of concurrently playing voices
    pub max_channels: u32,
    /// World units per meter, used for 3D attenuation
    pub distance_factor: f32,
    /// Doppler effect multiplier
    pub doppler_scale: f32,
    /// Distance rolloff multiplier
    pub rolloff_scale: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_channels: 32,
            distance_factor: 1.0,
            doppler_scale: 1.0,
            rolloff_scale: 0.0,
        }
    }
}

/// Values resolved at runtime for display in debug views. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Resolved audio backend version, e.g. `2.01.08`
    pub audio_backend_version: Option<String>,
    /// Name of the audio backend in use
    pub audio_backend_name: Option<&'static str>,
}

/// Top-level engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Audio configuration
    pub audio: AudioConfig,
    /// Runtime diagnostics
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl Settings {
    /// Save the settings to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SettingsError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| SettingsError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load settings from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content =
            fs::read_to_string(path).map_err(|e| SettingsError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Parse settings from a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    pub fn from_ron_str(content: &str) -> Result<Self, SettingsError> {
        ron::from_str(content).map_err(|e| SettingsError::DeserializeError(e.to_string()))
    }

    /// Load settings from a RON file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_ron(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({}): {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save the settings to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| SettingsError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| SettingsError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Errors that can occur during settings operations
#[derive(Debug, Clone)]
pub enum SettingsError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {}
