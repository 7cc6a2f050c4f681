//! Error type for the fallible edges of the crate.
//!
//! The sprite pipeline itself never fails: it reports partial work through
//! return values and tolerates dropped GPU writes. Errors only come from the
//! things around it, like reading a config file, decoding an image, or
//! bringing up a GPU device.

use std::fmt;

/// Errors that can occur outside the per-frame sprite pipeline.
#[derive(Debug)]
pub enum Error {
    /// A configuration file could not be parsed or holds invalid values.
    Config(String),
    /// A file could not be read.
    Io(std::io::Error),
    /// An image could not be decoded into a texture.
    Texture(String),
    /// The GPU adapter, device, or surface could not be created.
    Gpu(String),
    /// The event loop or window could not be created.
    Window(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "invalid renderer config: {e}"),
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Texture(e) => write!(f, "texture load failed: {e}"),
            Error::Gpu(e) => write!(f, "gpu init failed: {e}"),
            Error::Window(e) => write!(f, "window error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Texture(e.to_string())
    }
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_cause() {
        let e = Error::Config("max_quads must be non-zero".into());
        assert_eq!(e.to_string(), "invalid renderer config: max_quads must be non-zero");
    }

    #[test]
    fn io_error_is_source() {
        let e: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&e).is_some());
    }
}
