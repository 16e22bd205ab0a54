//! Error types for textswarm.
//!
//! Only configuration and host setup can fail. Everything that happens once
//! an engine is mounted (missing surface, empty text, ripple overflow) is
//! absorbed and logged instead of being reported here.

use std::fmt;

/// Errors that can occur while loading or validating an [`EngineConfig`].
///
/// [`EngineConfig`]: crate::EngineConfig
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    Io(std::io::Error),
    /// The config file is not valid JSON for this schema.
    Parse(serde_json::Error),
    /// A color string could not be parsed as `#rgb` or `#rrggbb`.
    InvalidColor(String),
    /// A field holds a value the engine cannot work with.
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::InvalidColor(s) => {
                write!(f, "Invalid color '{}'. Expected #rgb or #rrggbb.", s)
            }
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur when loading an outline font.
#[cfg(feature = "fontdue")]
#[derive(Debug)]
pub enum FontError {
    /// Failed to read the font file.
    Io(std::io::Error),
    /// The font data could not be parsed.
    Parse(&'static str),
}

#[cfg(feature = "fontdue")]
impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Io(e) => write!(f, "Failed to read font file: {}", e),
            FontError::Parse(msg) => write!(f, "Failed to parse font: {}", msg),
        }
    }
}

#[cfg(feature = "fontdue")]
impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::Io(e) => Some(e),
            FontError::Parse(_) => None,
        }
    }
}

#[cfg(feature = "fontdue")]
impl From<std::io::Error> for FontError {
    fn from(e: std::io::Error) -> Self {
        FontError::Io(e)
    }
}

/// Errors that can occur during GPU initialization for the windowed host.
#[cfg(feature = "window")]
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

#[cfg(feature = "window")]
impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

#[cfg(feature = "window")]
impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

#[cfg(feature = "window")]
impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

#[cfg(feature = "window")]
impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when running a host around the engine.
#[derive(Debug)]
pub enum HostError {
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// Writing an exported frame failed.
    Export(image::ImageError),
    /// Failed to create the output directory for exports.
    Io(std::io::Error),
    /// Failed to create event loop.
    #[cfg(feature = "window")]
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    #[cfg(feature = "window")]
    Window(winit::error::OsError),
    /// GPU initialization failed.
    #[cfg(feature = "window")]
    Gpu(GpuError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Config(e) => write!(f, "Config error: {}", e),
            HostError::Export(e) => write!(f, "Failed to write frame: {}", e),
            HostError::Io(e) => write!(f, "I/O error: {}", e),
            #[cfg(feature = "window")]
            HostError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            #[cfg(feature = "window")]
            HostError::Window(e) => write!(f, "Failed to create window: {}", e),
            #[cfg(feature = "window")]
            HostError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Config(e) => Some(e),
            HostError::Export(e) => Some(e),
            HostError::Io(e) => Some(e),
            #[cfg(feature = "window")]
            HostError::EventLoop(e) => Some(e),
            #[cfg(feature = "window")]
            HostError::Window(e) => Some(e),
            #[cfg(feature = "window")]
            HostError::Gpu(e) => Some(e),
        }
    }
}

impl From<ConfigError> for HostError {
    fn from(e: ConfigError) -> Self {
        HostError::Config(e)
    }
}

impl From<image::ImageError> for HostError {
    fn from(e: image::ImageError) -> Self {
        HostError::Export(e)
    }
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        HostError::Io(e)
    }
}

#[cfg(feature = "window")]
impl From<winit::error::EventLoopError> for HostError {
    fn from(e: winit::error::EventLoopError) -> Self {
        HostError::EventLoop(e)
    }
}

#[cfg(feature = "window")]
impl From<winit::error::OsError> for HostError {
    fn from(e: winit::error::OsError) -> Self {
        HostError::Window(e)
    }
}

#[cfg(feature = "window")]
impl From<GpuError> for HostError {
    fn from(e: GpuError) -> Self {
        HostError::Gpu(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_field_message() {
        let err = ConfigError::invalid("raster.stride", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'raster.stride': must be at least 1"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_parse_error_has_source() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::from(parse);
        assert!(err.source().is_some());

        let host = HostError::from(err);
        assert!(host.to_string().starts_with("Config error"));
    }
}
