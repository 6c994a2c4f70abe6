//! Engine error kinds.
//!
//! Four kinds, matching the error-handling design: configuration errors,
//! file-processing errors (wrapped with the offending file path), plugin errors
//! (caught and logged, never fatal), and output I/O errors (propagated, no retry).

use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    Configuration { field: String, message: String },
    FileProcessing { file: String, source: anyhow::Error },
    Plugin { plugin: String, source: anyhow::Error },
    Io(std::io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Configuration { field, message } => {
                write!(f, "configuration error in '{}': {}", field, message)
            }
            EngineError::FileProcessing { file, source } => {
                write!(f, "failed to process {}: {}", file, source)
            }
            EngineError::Plugin { plugin, source } => {
                write!(f, "plugin '{}' failed: {}", plugin, source)
            }
            EngineError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::FileProcessing { source, .. } => Some(source.as_ref()),
            EngineError::Plugin { source, .. } => Some(source.as_ref()),
            EngineError::Io(err) => Some(err),
            EngineError::Configuration { .. } => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err)
    }
}

impl EngineError {
    pub fn file_processing(file: impl Into<String>, source: anyhow::Error) -> Self {
        EngineError::FileProcessing {
            file: file.into(),
            source,
        }
    }

    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }
}
