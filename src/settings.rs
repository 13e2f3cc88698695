//! Geometry settings
//!
//! Stored as RON. Files may also be brotli compressed; loading detects which
//! by looking at the first byte.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Largest accepted skybox shift, in world units
pub const MAX_SKYBOX_OFFSET: f32 = 1024.0;

/// Switches for the geometry pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySettings {
    /// Whether transparent faces produce collision triangles
    pub transparent_collision: bool,
    /// Vertical shift of the skybox relative to the camera
    pub skybox_offset: f32,
    /// Copy each referenced atlas region into its own tile
    pub remap_textures: bool,
    /// Also isolate the regions of UV animated sequences
    pub remap_animated_uvs: bool,
    /// Pick the custom UV conversion for levels with non-standard fractions
    pub texture_mode_detection: bool,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            transparent_collision: true,
            skybox_offset: 0.0,
            remap_textures: true,
            remap_animated_uvs: true,
            texture_mode_detection: true,
        }
    }
}

/// Error type for settings loading
#[derive(Debug)]
pub enum SettingsError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    ValidationError(String),
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for SettingsError {
    fn from(e: ron::error::SpannedError) -> Self {
        SettingsError::ParseError(e)
    }
}

impl From<ron::Error> for SettingsError {
    fn from(e: ron::Error) -> Self {
        SettingsError::SerializeError(e)
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::IoError(e) => write!(f, "IO error: {}", e),
            SettingsError::ParseError(e) => write!(f, "Parse error: {}", e),
            SettingsError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            SettingsError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Default settings location: `<config dir>/tomb-geometry/settings.ron`
#[cfg(not(target_arch = "wasm32"))]
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tomb-geometry")
        .join("settings.ron")
}

#[cfg(target_arch = "wasm32")]
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.ron")
}

pub fn validate_settings(settings: &GeometrySettings) -> Result<(), SettingsError> {
    if !settings.skybox_offset.is_finite() {
        return Err(SettingsError::ValidationError(format!(
            "skybox_offset is not finite: {}",
            settings.skybox_offset
        )));
    }
    if settings.skybox_offset.abs() > MAX_SKYBOX_OFFSET {
        return Err(SettingsError::ValidationError(format!(
            "skybox_offset {} outside +/-{}",
            settings.skybox_offset, MAX_SKYBOX_OFFSET
        )));
    }
    Ok(())
}

/// Load settings from a RON file (plain or brotli compressed)
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<GeometrySettings, SettingsError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    // Plain RON starts with '(' or whitespace; anything else is treated as brotli
    let is_plain_ron = bytes
        .first()
        .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
        .unwrap_or(false);

    let contents = if is_plain_ron {
        String::from_utf8(bytes).map_err(|e| {
            SettingsError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8: {}", e),
            ))
        })?
    } else {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(&bytes), &mut decompressed).map_err(|e| {
            SettingsError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("brotli decompression failed: {}", e),
            ))
        })?;
        String::from_utf8(decompressed).map_err(|e| {
            SettingsError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8 after decompression: {}", e),
            ))
        })?
    };

    let settings = load_settings_from_str(&contents).map_err(|e| {
        log::warn!("failed to load settings from {}: {}", path.display(), e);
        e
    })?;
    log::debug!("loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings from the default path, falling back to defaults if the file
/// does not exist
pub fn load_or_default() -> Result<GeometrySettings, SettingsError> {
    let path = default_settings_path();
    if !path.exists() {
        return Ok(GeometrySettings::default());
    }
    load_settings(path)
}

/// Parse settings from a RON string
pub fn load_settings_from_str(s: &str) -> Result<GeometrySettings, SettingsError> {
    let settings: GeometrySettings = ron::from_str(s)?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Save settings as plain RON, creating parent directories as needed
pub fn save_settings<P: AsRef<Path>>(settings: &GeometrySettings, path: P) -> Result<(), SettingsError> {
    validate_settings(settings)?;
    let path = path.as_ref();

    let config = ron::ser::PrettyConfig::new()
        .depth_limit(2)
        .indentor("  ".to_string());
    let ron_string = ron::ser::to_string_pretty(settings, config)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, ron_string)?;
    Ok(())
}
