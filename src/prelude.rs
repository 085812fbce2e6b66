//! Prelude module for convenient imports.

pub use crate::editor::{Editor, EditorConfig};
pub use crate::error::{PlaygroundError, Result};
pub use crate::playground::Playground;
pub use crate::runtime::{ExecutionResult, PythonRuntime};
pub use crate::sandbox::{config::SandboxConfig, executor::PythonSandbox};
pub use crate::session::{Entry, EntryBody, EvaluationSession, SessionState};
