use std::fmt;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, WinogradError>;

/// Main error type for the Winograd pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum WinogradError {
    /// Problem dimensions the F(2,3) tiling cannot cover
    InvalidShape {
        name: String,
        reason: String,
    },

    /// Work-group extent of zero
    InvalidPartition {
        extent: usize,
        group: usize,
    },

    /// Buffer size overflows or exceeds the device's largest allocation
    Capacity {
        buffer: String,
        reason: String,
    },

    /// Device buffer could not be created
    Allocation {
        buffer: String,
        reason: String,
    },

    /// Program build failed; carries the build log
    Compile {
        kernel: String,
        log: String,
    },

    /// Stage bind, dispatch or queue synchronization failed
    Dispatch {
        operation: String,
        reason: String,
    },

    /// Stage executed out of dependency order
    StageOrder {
        stage: String,
        state: String,
    },

    /// File operations
    File(String),

    /// Malformed input or output text
    Parse(String),

    /// Malformed configuration
    Config(String),
}

impl fmt::Display for WinogradError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinogradError::InvalidShape { name, reason } => {
                write!(f, "Invalid shape '{}': {}", name, reason)
            }
            WinogradError::InvalidPartition { extent, group } => {
                write!(f, "Invalid partition of extent {}: group size {} must be positive", extent, group)
            }
            WinogradError::Capacity { buffer, reason } => {
                write!(f, "Capacity error for buffer {}: {}", buffer, reason)
            }
            WinogradError::Allocation { buffer, reason } => {
                write!(f, "Failed to allocate buffer {}: {}", buffer, reason)
            }
            WinogradError::Compile { kernel, log } => {
                write!(f, "Failed to build kernel '{}':\n{}", kernel, log)
            }
            WinogradError::Dispatch { operation, reason } => {
                write!(f, "{} failed: {}", operation, reason)
            }
            WinogradError::StageOrder { stage, state } => {
                write!(f, "Stage '{}' cannot run in state {}", stage, state)
            }
            WinogradError::File(msg) => write!(f, "File error: {}", msg),
            WinogradError::Parse(msg) => write!(f, "Parse error: {}", msg),
            WinogradError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for WinogradError {}

// Conversion from std::io::Error
impl From<std::io::Error> for WinogradError {
    fn from(err: std::io::Error) -> Self {
        WinogradError::File(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for WinogradError {
    fn from(err: serde_json::Error) -> Self {
        WinogradError::Config(err.to_string())
    }
}

// Helper functions for common error patterns
impl WinogradError {
    pub fn invalid_shape<S: Into<String>>(name: S, reason: S) -> Self {
        WinogradError::InvalidShape {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn dispatch<S: Into<String>>(operation: S, reason: S) -> Self {
        WinogradError::Dispatch {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a validation failure on user input rather than
    /// an accelerator fault.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, WinogradError::InvalidShape { .. })
    }

    /// Whether the image height or width is unusable for 2×2 output tiles
    pub fn is_image_extent_error(&self) -> bool {
        matches!(self, WinogradError::InvalidShape { name, .. } if name == "H" || name == "W")
    }
}
