//! Per-evaluation stream capture for the interpreter.
//!
//! Every run gets fresh pipes, so nothing one submission prints can leak into
//! the captured output of the next.

use wasmtime_wasi::pipe::{MemoryInputPipe, MemoryOutputPipe};

/// In-memory sink standing in for one of the interpreter's output streams.
#[derive(Clone, Debug)]
pub struct OutputSink {
    pipe: MemoryOutputPipe,
}

impl OutputSink {
    /// Create an empty sink that accepts up to `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            pipe: MemoryOutputPipe::new(capacity),
        }
    }

    /// The accumulated text, with invalid UTF-8 replaced.
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.pipe.contents()).into_owned()
    }

    /// Number of captured bytes.
    pub fn len(&self) -> usize {
        self.pipe.contents().len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The pipe handed to the WASI context.
    pub(crate) fn pipe(&self) -> MemoryOutputPipe {
        self.pipe.clone()
    }
}

/// The three standard streams wired into a single interpreter run.
#[derive(Clone, Debug)]
pub struct EvaluationIo {
    stdin: Vec<u8>,
    /// Captured stdout.
    pub stdout: OutputSink,
    /// Captured stderr.
    pub stderr: OutputSink,
}

impl EvaluationIo {
    /// Fresh streams with optional stdin text and the given capture capacity.
    pub fn new(input: Option<&str>, capacity: usize) -> Self {
        Self {
            stdin: input.map(|s| s.as_bytes().to_vec()).unwrap_or_default(),
            stdout: OutputSink::new(capacity),
            stderr: OutputSink::new(capacity),
        }
    }

    /// A stdin pipe that yields the provided input and then EOF.
    pub(crate) fn stdin_pipe(&self) -> MemoryInputPipe {
        MemoryInputPipe::new(self.stdin.clone())
    }

    /// Get the captured stdout as a string.
    pub fn stdout_str(&self) -> String {
        self.stdout.contents_lossy()
    }

    /// Get the captured stderr as a string.
    pub fn stderr_str(&self) -> String {
        self.stderr.contents_lossy()
    }
}
