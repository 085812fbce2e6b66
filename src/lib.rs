//! # Python Playground
//!
//! An editor-bound Python playground: the source in an [`Editor`] is run on
//! demand through an embedded interpreter, and each submission is echoed,
//! together with what it printed, into an append-only transcript.
//!
//! The interpreter is RustPython compiled to WebAssembly and hosted in
//! Wasmtime. It is loaded once, in the background; evaluations requested
//! before it is ready wait for it, and run one at a time in request order.
//!
//! - **Readiness gating**: a session is `Initializing` until the runtime
//!   loads, then `Ready`, or `Failed` with the reason if it never does
//! - **Output isolation**: every evaluation writes into a fresh stdout sink
//! - **Inline errors**: exceptions, timeouts and limit violations land in the
//!   transcript instead of failing the call
//! - **Isolation**: no filesystem, network or host environment access, with
//!   bounded memory and wall time
//!
//! ## Example
//!
//! ```rust,ignore
//! use python_playground_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let playground = Playground::with_sandbox(
//!         "code",
//!         EditorConfig::default(),
//!         SandboxConfig::builder()
//!             .interpreter_path("assets/rustpython.wasm")
//!             .build(),
//!     )?;
//!
//!     // The editor starts out holding `print('Hello world')`.
//!     let entry = playground.evaluate().await?;
//!     assert_eq!(entry.body.text(), "Hello world\n");
//!
//!     playground.editor().set_text("1 / 0");
//!     let entry = playground.evaluate().await?;
//!     assert!(entry.body.is_error());
//!
//!     print!("{}", playground.transcript());
//!     Ok(())
//! }
//! ```

pub mod editor;
pub mod error;
pub mod playground;
pub mod prelude;
pub mod runtime;
pub mod sandbox;
pub mod session;

// Re-export main types at crate root for convenience
pub use editor::{Editor, EditorConfig, EditorConfigBuilder, LanguageMode, DEFAULT_SNIPPET};
pub use error::{PlaygroundError, Result};
pub use playground::Playground;
pub use runtime::{ExecutionMetadata, ExecutionResult, PythonRuntime};
pub use sandbox::config::{SandboxConfig, SandboxConfigBuilder};
pub use sandbox::executor::PythonSandbox;
pub use session::{Entry, EntryBody, EvaluationSession, SessionState, Transcript};
