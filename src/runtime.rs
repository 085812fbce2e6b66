//! The seam between an evaluation session and the Python interpreter behind it.

use std::future::Future;
use std::time::Duration;

use crate::error::{parse_python_exception, PlaygroundError, Result};

/// Snippet run once after load to report the interpreter version.
pub const VERSION_SNIPPET: &str = "import sys\nprint(sys.version)";

/// Timing and resource figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionMetadata {
    /// Wall time spent inside the interpreter.
    pub duration: Duration,
    /// Peak linear memory in bytes.
    pub peak_memory: u64,
}

/// Result of running one source string.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Captured stdout output.
    pub stdout: String,
    /// Captured stderr output.
    pub stderr: String,
    /// Exit code (0 for success).
    pub exit_code: i32,
    pub metadata: ExecutionMetadata,
}

impl ExecutionResult {
    /// Check if the execution was successful (exit code 0).
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Text to show in place of output when the run failed.
    ///
    /// `None` for a successful run. Otherwise the interpreter's stderr, or an
    /// exit-code message when stderr is empty.
    pub fn failure_text(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        let stderr = self.stderr.trim_end();
        if stderr.is_empty() {
            Some(format!("process exited with code {}", self.exit_code))
        } else {
            Some(stderr.to_string())
        }
    }

    /// The Python exception reported on stderr, if any.
    pub fn exception(&self) -> Option<PlaygroundError> {
        if self.is_success() {
            return None;
        }
        parse_python_exception(&self.stderr)
    }
}

/// An interpreter that can run Python source and capture its standard streams.
///
/// Implementations get a fresh output sink for every call. Callers serialize
/// calls; implementations need not be reentrant.
pub trait PythonRuntime: Send + Sync + 'static {
    /// Run `code` to completion.
    ///
    /// Python-level errors come back as a non-zero [`ExecutionResult::exit_code`];
    /// `Err` is reserved for host failures such as timeouts or memory exhaustion.
    fn execute(&self, code: &str) -> impl Future<Output = Result<ExecutionResult>> + Send;
}

/// Ask the runtime for its version string.
pub async fn introspect_version<R: PythonRuntime>(runtime: &R) -> Result<String> {
    let result = runtime.execute(VERSION_SNIPPET).await?;
    if let Some(text) = result.failure_text() {
        return Err(PlaygroundError::ExecutionFailed(text));
    }
    Ok(result.stdout.trim().to_string())
}
