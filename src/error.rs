//! Error types and handling for shmlog

/// Result type alias for shmlog operations
pub type Result<T> = std::result::Result<T, ShmLogError>;

/// Error kinds raised while attaching to, draining, and persisting a log ring
#[derive(Debug, thiserror::Error)]
pub enum ShmLogError {
    /// The named segment could not be attached (missing, too small, denied)
    #[error("Attach failed for segment {name}: {message}")]
    Attach {
        name: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The cross-process lock could not be acquired this cycle
    #[error("Lock unavailable for segment {name}: {message}")]
    Lock { name: String, message: String },

    /// Header cursors that cannot be drained safely
    #[error(
        "Corrupt cursors: write_pos {write_pos}, read_pos {read_pos}, \
         log area {log_area_size} bytes - {message}"
    )]
    CorruptCursor {
        write_pos: u32,
        read_pos: u32,
        log_area_size: usize,
        message: String,
    },

    /// Slot text that does not follow the `[timestamp] content` shape
    #[error("Malformed log record: {text:?}")]
    Parse { text: String },

    /// A sink could not accept a batch as a whole
    #[error("Sink {sink} failed: {message}")]
    Sink { sink: String, message: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// I/O related errors outside of attach
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration or journal (de)serialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl ShmLogError {
    /// Create an attach error, keeping the underlying I/O error if any
    pub fn attach(
        name: impl Into<String>,
        message: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::Attach {
            name: name.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a lock error
    pub fn lock(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lock {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a corrupt cursor error
    pub fn corrupt_cursor(
        write_pos: u32,
        read_pos: u32,
        log_area_size: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::CorruptCursor {
            write_pos,
            read_pos,
            log_area_size,
            message: message.into(),
        }
    }

    /// Create a parse error for the given slot text
    pub fn parse(text: impl Into<String>) -> Self {
        Self::Parse { text: text.into() }
    }

    /// Create a sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether the failure is expected to clear up on the next poll
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Lock { .. })
    }

    /// Whether the failure prevents ingestion from starting
    pub fn is_attach(&self) -> bool {
        matches!(self, Self::Attach { .. })
    }
}

impl From<std::io::Error> for ShmLogError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

impl From<serde_json::Error> for ShmLogError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
