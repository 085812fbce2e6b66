//! Wiring of an editor and an evaluation session into one playground.

use std::future::Future;

use crate::editor::{Editor, EditorConfig};
use crate::error::Result;
use crate::runtime::PythonRuntime;
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::executor::PythonSandbox;
use crate::session::{Entry, EvaluationSession, SessionState};

/// An editor bound to a Python runtime, with a transcript of everything run.
///
/// Cloning is cheap; clones drive the same editor and session.
pub struct Playground<R> {
    editor: Editor,
    session: EvaluationSession<R>,
}

impl<R> Clone for Playground<R> {
    fn clone(&self) -> Self {
        Self {
            editor: self.editor.clone(),
            session: self.session.clone(),
        }
    }
}

impl<R> std::fmt::Debug for Playground<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playground")
            .field("editor", &self.editor)
            .field("session", &self.session)
            .finish()
    }
}

impl Playground<PythonSandbox> {
    /// Launch a playground backed by the wasm interpreter named in `sandbox`.
    pub fn with_sandbox(
        anchor: impl Into<String>,
        editor_config: EditorConfig,
        sandbox: SandboxConfig,
    ) -> Result<Self> {
        Self::launch(anchor, editor_config, PythonSandbox::load(sandbox))
    }
}

impl<R: PythonRuntime> Playground<R> {
    /// Mount the editor, then start loading the runtime in the background.
    ///
    /// The editor is usable immediately; evaluations wait for `loader`.
    pub fn launch<F>(anchor: impl Into<String>, editor_config: EditorConfig, loader: F) -> Result<Self>
    where
        F: Future<Output = Result<R>> + Send + 'static,
    {
        let editor = Editor::initialize(anchor, editor_config);
        let session = EvaluationSession::new(editor.clone());
        session.initialize(loader)?;
        Ok(Self { editor, session })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn session(&self) -> &EvaluationSession<R> {
        &self.session
    }

    /// See [`EvaluationSession::evaluate`].
    pub async fn evaluate(&self) -> Result<Entry> {
        self.session.evaluate().await
    }

    pub fn reset(&self) {
        self.session.reset();
    }

    pub fn transcript(&self) -> String {
        self.session.transcript()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }
}
