//! Error types for Glyphfall.
//!
//! Only setup-time operations are fallible: loading the equation manifest,
//! fetching and decoding equation images, and parsing or validating the
//! engine configuration. The per-frame path never returns errors; failures
//! there degrade the visual and are logged.

use std::fmt;

/// Errors that can occur while loading equation assets.
#[derive(Debug)]
pub enum AssetError {
    /// Failed to read asset bytes.
    Io(std::io::Error),
    /// Failed to decode image bytes.
    Decode(image::ImageError),
    /// Failed to parse the equation manifest.
    Manifest(serde_json::Error),
    /// The asset source has nothing at the requested path.
    Missing(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "Failed to read equation asset: {}", e),
            AssetError::Decode(e) => write!(f, "Failed to decode equation image: {}", e),
            AssetError::Manifest(e) => write!(f, "Failed to parse equation manifest: {}", e),
            AssetError::Missing(path) => write!(f, "No equation asset at '{}'", path),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(e) => Some(e),
            AssetError::Decode(e) => Some(e),
            AssetError::Manifest(e) => Some(e),
            AssetError::Missing(_) => None,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

impl From<image::ImageError> for AssetError {
    fn from(e: image::ImageError) -> Self {
        AssetError::Decode(e)
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(e: serde_json::Error) -> Self {
        AssetError::Manifest(e)
    }
}

/// Errors that can occur when loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration document is not valid JSON for the schema.
    Parse(serde_json::Error),
    /// A value is out of its permitted range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Failed to parse engine config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid engine config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
