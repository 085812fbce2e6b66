//! Error types for the Python playground.

use thiserror::Error;

/// Errors that can occur while initializing or driving the playground.
#[derive(Error, Debug)]
pub enum PlaygroundError {
    /// The execution exceeded the configured timeout.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The execution exceeded memory limits.
    #[error("memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    /// The execution exceeded a non-memory store limit, such as table size.
    #[error("resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    /// Failed to initialize the Wasm runtime.
    #[error("failed to initialize runtime: {0}")]
    RuntimeInit(#[source] anyhow::Error),

    /// Failed to load or instantiate the Python interpreter module.
    #[error("failed to load Python interpreter: {0}")]
    ModuleLoad(#[source] anyhow::Error),

    /// The host failed to drive the execution to completion.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A Python exception was raised by the submitted source.
    #[error("Python {exception_type}: {message}")]
    PythonException {
        /// The type of Python exception (e.g., "ValueError", "TypeError").
        exception_type: String,
        /// The exception message.
        message: String,
        /// The full Python traceback, if available.
        traceback: Option<String>,
    },

    /// I/O error while preparing the runtime.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The interpreter wasm file was not found.
    #[error("Python interpreter wasm not found at: {0}")]
    InterpreterNotFound(String),

    /// Execution ran out of fuel (instruction limit).
    #[error("execution ran out of fuel after {consumed:?} instructions")]
    OutOfFuel {
        /// Number of instructions consumed before running out.
        consumed: Option<u64>,
    },

    /// The runtime never became ready; carries the initialization failure.
    #[error("Python runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// `initialize` was called on a session that already left `Uninitialized`.
    #[error("session is already initialized")]
    AlreadyInitialized,
}

impl PlaygroundError {
    /// Check if this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PlaygroundError::Timeout(_))
    }

    /// Check if this error represents a memory limit exceeded.
    pub fn is_memory_limit(&self) -> bool {
        matches!(self, PlaygroundError::MemoryLimitExceeded(_))
    }

    /// Check if this error represents a Python exception.
    pub fn is_python_exception(&self) -> bool {
        matches!(self, PlaygroundError::PythonException { .. })
    }

    /// Check if this error represents an out-of-fuel condition.
    pub fn is_out_of_fuel(&self) -> bool {
        matches!(self, PlaygroundError::OutOfFuel { .. })
    }

    /// Check if this error means the runtime failed to come up.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PlaygroundError::RuntimeUnavailable(_))
    }
}

/// Result type alias for playground operations.
pub type Result<T> = std::result::Result<T, PlaygroundError>;

/// Parse a Python exception from stderr output.
///
/// The last unindented line shaped like `SomethingError: message` is taken as
/// the exception; a preceding `Traceback (most recent call last):` header is
/// kept as the traceback.
pub fn parse_python_exception(stderr: &str) -> Option<PlaygroundError> {
    let lines: Vec<&str> = stderr.lines().collect();

    let mut exception_line = None;
    let mut traceback_start = None;

    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("Traceback (most recent call last):") {
            traceback_start = Some(i);
            continue;
        }
        if !line.starts_with(' ') && looks_like_exception(line) {
            exception_line = Some((i, *line));
        }
    }

    let (line_idx, exception_str) = exception_line?;
    let (exception_type, message) = match exception_str.split_once(':') {
        Some((exc_type, msg)) => (exc_type.trim().to_string(), msg.trim().to_string()),
        None => (exception_str.trim().to_string(), String::new()),
    };

    let traceback = traceback_start
        .filter(|start| *start < line_idx)
        .map(|start| lines[start..=line_idx].join("\n"));

    Some(PlaygroundError::PythonException {
        exception_type,
        message,
        traceback,
    })
}

/// Exception names end in one of these, or are one of the builtin control-flow exceptions.
fn looks_like_exception(line: &str) -> bool {
    const SUFFIXES: [&str; 3] = ["Error", "Exception", "Warning"];
    const STANDALONE: [&str; 4] = [
        "KeyboardInterrupt",
        "SystemExit",
        "StopIteration",
        "GeneratorExit",
    ];

    if !line.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return false;
    }

    // The name is everything up to the first colon; dotted module paths are allowed.
    let name = line.split(':').next().unwrap_or(line).trim_end();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return false;
    }
    let short = name.rsplit('.').next().unwrap_or(name);

    SUFFIXES.iter().any(|suffix| short.ends_with(suffix)) || STANDALONE.contains(&short)
}
