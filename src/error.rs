use std::fmt;

/// Errors surfaced by render, effect, and I/O operations.
#[derive(Debug)]
pub enum RenderError {
    /// A parameter was out of range or would make a filter unstable.
    InvalidParameter {
        name: &'static str,
        message: String,
    },
    /// A required external resource (sample folder, bank entry) is absent.
    MissingResource { what: String },
    /// WAV encode/decode failure.
    Wav(hound::Error),
    /// Preset bank JSON failure.
    Preset(serde_json::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidParameter { name, message } => {
                write!(f, "Invalid parameter '{name}': {message}")
            }
            RenderError::MissingResource { what } => {
                write!(f, "Missing resource: {what}")
            }
            RenderError::Wav(e) => write!(f, "WAV error: {e}"),
            RenderError::Preset(e) => write!(f, "Preset error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<hound::Error> for RenderError {
    fn from(e: hound::Error) -> Self {
        RenderError::Wav(e)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        RenderError::Preset(e)
    }
}

impl RenderError {
    /// Shorthand for an `InvalidParameter` with a formatted message.
    pub fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        RenderError::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}
