//! Evaluation session: one-shot runtime initialization, gated and serialized
//! evaluation of the editor's source, and the transcript it feeds.

pub mod state;
pub mod transcript;

use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::sync::{watch, Mutex};

use crate::editor::Editor;
use crate::error::{PlaygroundError, Result};
use crate::runtime::{introspect_version, PythonRuntime};

pub use state::SessionState;
pub use transcript::{Entry, EntryBody, Transcript};

use transcript::{INITIALIZING_MESSAGE, READY_MESSAGE};

/// Drives a [`PythonRuntime`] on behalf of an [`Editor`].
///
/// Clones share the same runtime, transcript and state.
pub struct EvaluationSession<R> {
    inner: Arc<Inner<R>>,
}

struct Inner<R> {
    editor: Editor,
    transcript: Transcript,
    state: watch::Sender<SessionState>,
    runtime: OnceLock<R>,
    // Fair, so evaluations run in the order they were requested.
    turn: Mutex<()>,
}

impl<R> Clone for EvaluationSession<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> std::fmt::Debug for EvaluationSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationSession")
            .field("state", &*self.inner.state.borrow())
            .field("transcript_len", &self.inner.transcript.len())
            .finish_non_exhaustive()
    }
}

impl<R: PythonRuntime> EvaluationSession<R> {
    /// A session reading from `editor`, not yet initialized.
    pub fn new(editor: Editor) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            inner: Arc::new(Inner {
                editor,
                transcript: Transcript::new(),
                state,
                runtime: OnceLock::new(),
                turn: Mutex::new(()),
            }),
        }
    }

    /// Start loading the runtime in the background.
    ///
    /// Returns immediately. The session settles into [`SessionState::Ready`]
    /// once `loader` resolves and the version has been queried, or into
    /// [`SessionState::Failed`] if `loader` errors or panics. Outside a tokio
    /// runtime this fails with [`PlaygroundError::RuntimeInit`] and leaves the
    /// session `Uninitialized`.
    pub fn initialize<F>(&self, loader: F) -> Result<()>
    where
        F: Future<Output = Result<R>> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            PlaygroundError::RuntimeInit(anyhow::anyhow!("no tokio runtime to load on: {}", e))
        })?;

        let claimed = self.inner.state.send_if_modified(|state| {
            if *state == SessionState::Uninitialized {
                *state = SessionState::Initializing;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(PlaygroundError::AlreadyInitialized);
        }

        self.inner.transcript.replace(INITIALIZING_MESSAGE);
        tracing::info!("initializing Python runtime");

        let inner = Arc::clone(&self.inner);
        let loader_handle = handle.clone();
        handle.spawn(async move {
            let outcome = match loader_handle.spawn(loader).await {
                Ok(outcome) => outcome,
                Err(e) => Err(PlaygroundError::RuntimeInit(anyhow::anyhow!(
                    "initialization task aborted: {}",
                    e
                ))),
            };
            inner.settle(outcome).await;
        });

        Ok(())
    }

    /// Wait until initialization settles and return the runtime.
    ///
    /// A session that was never initialized fails immediately instead of waiting.
    pub async fn wait_ready(&self) -> Result<&R> {
        let mut state = self.inner.state.subscribe();
        let settled = state
            .wait_for(|state| state.is_settled() || *state == SessionState::Uninitialized)
            .await
            .map_err(|_| PlaygroundError::RuntimeUnavailable("session closed".to_string()))?
            .clone();

        match settled {
            SessionState::Uninitialized => Err(PlaygroundError::RuntimeUnavailable(
                "session not initialized".to_string(),
            )),
            SessionState::Failed { reason } => Err(PlaygroundError::RuntimeUnavailable(reason)),
            _ => self.inner.runtime.get().ok_or_else(|| {
                PlaygroundError::RuntimeUnavailable("runtime handle missing".to_string())
            }),
        }
    }

    /// Run the editor's current source and append the result to the transcript.
    ///
    /// Waits for initialization first; calls made before the runtime is ready
    /// run in the order they were made. Calls never overlap, and each one gets
    /// its own output sink. Errors raised by the submitted code, as well as
    /// timeouts and limit violations, are recorded in the transcript and do
    /// not fail the call. The only error returned is
    /// [`PlaygroundError::RuntimeUnavailable`], when initialization failed or
    /// was never started.
    pub async fn evaluate(&self) -> Result<Entry> {
        let _turn = self.inner.turn.lock().await;
        let runtime = self.wait_ready().await?;

        let source = self.inner.editor.text();
        tracing::debug!(bytes = source.len(), "evaluating submission");

        let entry = match runtime.execute(&source).await {
            Ok(result) => match result.failure_text() {
                None => Entry::output(source, result.stdout),
                Some(text) => {
                    if let Some(exception) = result.exception() {
                        tracing::debug!(%exception, "submission raised");
                    }
                    Entry::error(source, text)
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "evaluation aborted");
                Entry::error(source, e.to_string())
            }
        };

        self.inner.transcript.append(&entry);
        Ok(entry)
    }

    /// Clear the transcript.
    pub fn reset(&self) {
        self.inner.transcript.reset();
    }

    /// Snapshot of the transcript text.
    pub fn transcript(&self) -> String {
        self.inner.transcript.text()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn editor(&self) -> &Editor {
        &self.inner.editor
    }
}

impl<R: PythonRuntime> Inner<R> {
    async fn settle(&self, outcome: Result<R>) {
        match outcome {
            Ok(runtime) => {
                let version = match introspect_version(&runtime).await {
                    Ok(version) => version,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not query Python version");
                        "unknown".to_string()
                    }
                };
                self.transcript
                    .replace(format!("{version}\n{READY_MESSAGE}\n"));
                // Only the task spawned by the winning `initialize` call gets here.
                let _ = self.runtime.set(runtime);
                tracing::info!(%version, "Python runtime ready");
                self.state.send_replace(SessionState::Ready { version });
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(error = %reason, "Python runtime failed to initialize");
                self.transcript
                    .replace(format!("Initialization failed: {reason}\n"));
                self.state.send_replace(SessionState::Failed { reason });
            }
        }
    }
}
