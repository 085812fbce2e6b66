//! Session behavior against a scripted in-process runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use python_playground_rs::prelude::*;
use python_playground_rs::runtime::VERSION_SNIPPET;
use python_playground_rs::{ExecutionMetadata, DEFAULT_SNIPPET};
use tokio::sync::oneshot;
use tokio_test::{assert_pending, assert_ready};

/// Understands just enough Python for these tests:
/// `print('...')` lines, `raise Name('...')` lines, `ticket()` and the
/// version snippet. `ticket()` prints a counter that increases with every run,
/// and `slow()` fails the run the way an interpreter timeout does.
#[derive(Default)]
struct ScriptedRuntime {
    tickets: AtomicUsize,
    /// Make the version snippet exit with an error.
    broken_version: bool,
    /// Yield to the scheduler between starting and finishing a run.
    yield_mid_run: bool,
    in_flight: AtomicUsize,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedRuntime {
    fn ok(stdout: String) -> ExecutionResult {
        ExecutionResult {
            stdout,
            stderr: String::new(),
            exit_code: 0,
            metadata: ExecutionMetadata::default(),
        }
    }

    fn run(&self, code: &str) -> ExecutionResult {
        if code == VERSION_SNIPPET && self.broken_version {
            return ExecutionResult {
                stdout: String::new(),
                stderr: "ImportError: no module named 'sys'\n".to_string(),
                exit_code: 1,
                metadata: ExecutionMetadata::default(),
            };
        }
        if code == VERSION_SNIPPET {
            return Self::ok("3.11.0 (scripted)\n".to_string());
        }

        let mut stdout = String::new();
        for line in code.lines() {
            let line = line.trim();
            if line == "ticket()" {
                let n = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
                stdout.push_str(&format!("ticket {n}\n"));
            } else if let Some(arg) = quoted_call(line, "print") {
                stdout.push_str(arg);
                stdout.push('\n');
            } else if let Some(rest) = line.strip_prefix("raise ") {
                let (name, arg) = rest.split_once('(').unwrap_or((rest, ""));
                let message = arg.trim_end_matches(')').trim_matches('\'');
                return ExecutionResult {
                    stdout,
                    stderr: format!(
                        "Traceback (most recent call last):\n  File \"<string>\", line 1, in <module>\n{name}: {message}\n"
                    ),
                    exit_code: 1,
                    metadata: ExecutionMetadata::default(),
                };
            }
        }
        Self::ok(stdout)
    }
}

fn quoted_call<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.strip_prefix(name)?
        .strip_prefix("('")?
        .strip_suffix("')")
}

impl PythonRuntime for ScriptedRuntime {
    async fn execute(&self, code: &str) -> python_playground_rs::Result<ExecutionResult> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if self.yield_mid_run {
            tokio::task::yield_now().await;
        }
        let result = self.run(code);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if code.trim() == "slow()" {
            return Err(PlaygroundError::Timeout(Duration::from_secs(1)));
        }
        Ok(result)
    }
}

async fn ready_playground() -> Playground<ScriptedRuntime> {
    let playground = Playground::launch("code", EditorConfig::default(), async {
        Ok(ScriptedRuntime::default())
    })
    .unwrap();
    playground.session().wait_ready().await.unwrap();
    playground
}

/// A playground whose runtime arrives only when the returned sender fires.
fn gated_playground() -> (Playground<ScriptedRuntime>, oneshot::Sender<ScriptedRuntime>) {
    let (tx, rx) = oneshot::channel::<ScriptedRuntime>();
    let playground = Playground::launch("code", EditorConfig::default(), async move {
        rx.await
            .map_err(|_| PlaygroundError::RuntimeUnavailable("loader dropped".to_string()))
    })
    .unwrap();
    (playground, tx)
}

#[tokio::test]
async fn test_editor_is_seeded_before_runtime_is_ready() {
    let (playground, _tx) = gated_playground();

    assert_eq!(playground.editor().text(), DEFAULT_SNIPPET);
    assert_eq!(playground.state(), SessionState::Initializing);
    assert_eq!(playground.transcript(), "Initializing...\n");
}

#[tokio::test]
async fn test_hello_world_scenario() {
    let playground = ready_playground().await;
    assert_eq!(playground.transcript(), "3.11.0 (scripted)\nPython Ready !\n");

    playground.evaluate().await.unwrap();

    assert_eq!(
        playground.transcript(),
        "3.11.0 (scripted)\nPython Ready !\n>>> print('Hello world')\nHello world\n\n"
    );
}

#[tokio::test]
async fn test_evaluate_only_appends() {
    let playground = ready_playground().await;

    for source in ["print('a')", "print('b')\nprint('c')", "x = 1"] {
        let before = playground.transcript();
        playground.editor().set_text(source);

        let entry = playground.evaluate().await.unwrap();

        assert_eq!(playground.transcript(), format!("{before}{entry}"));
        assert_eq!(entry.source, source);
    }
}

#[tokio::test]
async fn test_execution_error_is_surfaced_inline() {
    let playground = ready_playground().await;
    playground
        .editor()
        .set_text("print('partial')\nraise ZeroDivisionError('division by zero')");
    let before = playground.transcript();

    let entry = playground.evaluate().await.unwrap();

    assert!(entry.body.is_error());
    assert!(entry.body.text().starts_with("Traceback (most recent call last):"));
    assert!(entry.body.text().ends_with("ZeroDivisionError: division by zero"));
    assert!(!entry.body.text().contains("partial"));
    assert_eq!(playground.transcript(), format!("{before}{entry}"));
    assert!(playground
        .transcript()
        .ends_with("ZeroDivisionError: division by zero\n\n"));

    // The session stays usable.
    playground.editor().set_text("print('next')");
    let entry = playground.evaluate().await.unwrap();
    assert_eq!(entry.body, EntryBody::Output("next\n".to_string()));
}

#[tokio::test]
async fn test_reset_clears_and_is_idempotent() {
    let playground = ready_playground().await;
    playground.evaluate().await.unwrap();

    playground.reset();
    assert_eq!(playground.transcript(), "");
    playground.reset();
    assert_eq!(playground.transcript(), "");

    let entry = playground.evaluate().await.unwrap();
    assert_eq!(playground.transcript(), entry.to_string());
}

#[tokio::test]
async fn test_evaluate_waits_for_readiness() {
    let (playground, tx) = gated_playground();

    let mut pending = tokio_test::task::spawn(playground.evaluate());
    assert_pending!(pending.poll());
    tokio::task::yield_now().await;
    assert_pending!(pending.poll());
    assert_eq!(playground.transcript(), "Initializing...\n");

    assert!(tx.send(ScriptedRuntime::default()).is_ok());
    playground.session().wait_ready().await.unwrap();

    let entry = assert_ready!(pending.poll()).unwrap();
    assert_eq!(entry.body.text(), "Hello world\n");
    assert!(playground
        .transcript()
        .starts_with("3.11.0 (scripted)\nPython Ready !\n>>> "));
}

#[tokio::test]
async fn test_pre_ready_evaluations_run_in_request_order() {
    let (playground, tx) = gated_playground();
    playground.editor().set_text("ticket()");

    let first = tokio::spawn({
        let playground = playground.clone();
        async move { playground.evaluate().await }
    });
    tokio::task::yield_now().await;
    let second = tokio::spawn({
        let playground = playground.clone();
        async move { playground.evaluate().await }
    });
    tokio::task::yield_now().await;

    assert!(tx.send(ScriptedRuntime::default()).is_ok());

    let second = second.await.unwrap().unwrap();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.body.text(), "ticket 1\n");
    assert_eq!(second.body.text(), "ticket 2\n");
    assert!(playground
        .transcript()
        .ends_with(&format!("{first}{second}")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_evaluations_never_overlap() {
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let runtime = ScriptedRuntime {
        yield_mid_run: true,
        max_in_flight: Arc::clone(&max_in_flight),
        ..ScriptedRuntime::default()
    };
    let playground =
        Playground::launch("code", EditorConfig::default(), async move { Ok(runtime) }).unwrap();
    playground.editor().set_text("ticket()");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let playground = playground.clone();
            tokio::spawn(async move { playground.evaluate().await })
        })
        .collect();
    for handle in handles {
        let entry = handle.await.unwrap().unwrap();
        assert!(entry.body.text().starts_with("ticket "));
        assert_eq!(entry.body.text().lines().count(), 1);
    }

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(playground.transcript().matches(">>> ticket()").count(), 16);
}

#[tokio::test]
async fn test_failed_initialization_is_reported() {
    let playground = Playground::<ScriptedRuntime>::launch(
        "code",
        EditorConfig::default(),
        async { Err(PlaygroundError::Config("no interpreter configured".to_string())) },
    )
    .unwrap();

    let err = playground.evaluate().await.unwrap_err();

    assert!(matches!(err, PlaygroundError::RuntimeUnavailable(ref reason) if reason.contains("no interpreter configured")));
    assert_eq!(
        playground.state(),
        SessionState::Failed {
            reason: "configuration error: no interpreter configured".to_string()
        }
    );
    assert_eq!(
        playground.transcript(),
        "Initialization failed: configuration error: no interpreter configured\n"
    );
}

#[tokio::test]
async fn test_dropped_loader_fails_pending_evaluations() {
    let (playground, tx) = gated_playground();
    let pending = tokio::spawn({
        let playground = playground.clone();
        async move { playground.evaluate().await }
    });
    tokio::task::yield_now().await;

    drop(tx);

    let err = pending.await.unwrap().unwrap_err();
    assert!(err.is_unavailable());
    assert!(playground.state().is_failed());
}

#[tokio::test]
async fn test_runtime_failure_is_written_as_error_block() {
    let playground = ready_playground().await;
    playground.editor().set_text("slow()");
    let before = playground.transcript();

    let entry = playground.evaluate().await.unwrap();

    assert_eq!(entry.body, EntryBody::Error("execution timed out after 1s".to_string()));
    assert_eq!(
        playground.transcript(),
        format!("{before}>>> slow()\nexecution timed out after 1s\n\n")
    );
    assert!(playground.state().is_ready());

    playground.editor().set_text("print('after')");
    let entry = playground.evaluate().await.unwrap();
    assert_eq!(entry.body, EntryBody::Output("after\n".to_string()));
}

#[tokio::test]
async fn test_failed_version_query_still_becomes_ready() {
    let runtime = ScriptedRuntime {
        broken_version: true,
        ..ScriptedRuntime::default()
    };
    let playground =
        Playground::launch("code", EditorConfig::default(), async move { Ok(runtime) }).unwrap();
    playground.session().wait_ready().await.unwrap();

    assert_eq!(
        playground.state(),
        SessionState::Ready {
            version: "unknown".to_string()
        }
    );
    assert_eq!(playground.transcript(), "unknown\nPython Ready !\n");

    let entry = playground.evaluate().await.unwrap();
    assert_eq!(entry.body.text(), "Hello world\n");
}
