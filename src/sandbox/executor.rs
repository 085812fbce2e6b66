//! The wasm-hosted Python interpreter behind a playground session.

use std::time::Instant;

use wasmtime::{Engine, Linker, Module, Store, Trap, UpdateDeadline};
use wasmtime_wasi::preview1;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

use crate::error::{PlaygroundError, Result};
use crate::runtime::{ExecutionMetadata, ExecutionResult, PythonRuntime};
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::io::EvaluationIo;
use crate::sandbox::limits::{ApplyCeiling, RunState};

/// Trap payload raised by the epoch callback once the wall-clock deadline passes.
#[derive(Debug, thiserror::Error)]
#[error("evaluation deadline passed")]
struct DeadlinePassed;

/// A compiled RustPython interpreter.
///
/// The module is compiled once; every execution instantiates it into a fresh
/// store with fresh standard streams, no preopened directories and no
/// inherited environment.
pub struct PythonSandbox {
    config: SandboxConfig,
    engine: Engine,
    module: Module,
}

impl std::fmt::Debug for PythonSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PythonSandbox")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PythonSandbox {
    /// Compile the interpreter named by `config`.
    pub fn new(config: SandboxConfig) -> Result<Self> {
        config.validate()?;

        let mut engine_config = wasmtime::Config::new();
        engine_config.epoch_interruption(true);
        engine_config.consume_fuel(config.max_fuel.is_some());

        let engine = Engine::new(&engine_config).map_err(|e| {
            PlaygroundError::RuntimeInit(anyhow::anyhow!("failed to create engine: {}", e))
        })?;

        let wasm_bytes = std::fs::read(&config.interpreter_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlaygroundError::InterpreterNotFound(config.interpreter_path.display().to_string())
            } else {
                PlaygroundError::Io(e)
            }
        })?;

        let module = Module::new(&engine, &wasm_bytes).map_err(|e| {
            PlaygroundError::ModuleLoad(anyhow::anyhow!("failed to compile module: {}", e))
        })?;

        tracing::info!(
            path = %config.interpreter_path.display(),
            bytes = wasm_bytes.len(),
            "compiled Python interpreter"
        );

        Ok(Self {
            config,
            engine,
            module,
        })
    }

    /// Compile the interpreter off the async executor.
    ///
    /// This is the loader handed to [`EvaluationSession::initialize`](crate::EvaluationSession::initialize).
    pub async fn load(config: SandboxConfig) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::new(config))
            .await
            .map_err(|e| PlaygroundError::RuntimeInit(anyhow::anyhow!("loader task failed: {}", e)))?
    }

    /// The configuration this interpreter was compiled with.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute Python code, optionally feeding `input` to stdin.
    pub async fn execute(&self, code: &str, input: Option<&str>) -> Result<ExecutionResult> {
        let timeout = self.config.timeout;
        let deadline = Instant::now() + timeout;

        let ticker_engine = self.engine.clone();
        let tick = self.config.epoch_tick_interval;
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                ticker_engine.increment_epoch();
            }
        });

        let engine = self.engine.clone();
        let module = self.module.clone();
        let config = self.config.clone();
        let code = code.to_string();
        let input = input.map(str::to_string);
        let exec = tokio::task::spawn_blocking(move || {
            Self::execute_sync(&engine, &module, &config, deadline, &code, input.as_deref())
        });

        let result = tokio::select! {
            joined = exec => match joined {
                Ok(result) => result,
                Err(e) => Err(PlaygroundError::ExecutionFailed(format!("task panicked: {}", e))),
            },
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                // Wake the store so its epoch callback observes the passed deadline.
                self.engine.increment_epoch();
                Err(PlaygroundError::Timeout(timeout))
            }
        };
        ticker.abort();

        result
    }

    fn execute_sync(
        engine: &Engine,
        module: &Module,
        config: &SandboxConfig,
        deadline: Instant,
        code: &str,
        input: Option<&str>,
    ) -> Result<ExecutionResult> {
        let io = EvaluationIo::new(input, config.max_output_bytes);

        let wasi_ctx = WasiCtxBuilder::new()
            .args(&["python", "-c", code])
            .stdin(io.stdin_pipe())
            .stdout(io.stdout.pipe())
            .stderr(io.stderr.pipe())
            .build_p1();

        let mut store = Store::new(engine, RunState::new(config.max_memory, wasi_ctx));
        store.apply_ceiling();

        store.set_epoch_deadline(1);
        store.epoch_deadline_callback(move |_ctx| {
            if Instant::now() >= deadline {
                Err(DeadlinePassed.into())
            } else {
                Ok(UpdateDeadline::Continue(1))
            }
        });

        if let Some(fuel) = config.max_fuel {
            store.set_fuel(fuel).map_err(|e| {
                PlaygroundError::RuntimeInit(anyhow::anyhow!("failed to set fuel: {}", e))
            })?;
        }

        let mut linker = Linker::new(engine);
        preview1::add_to_linker_sync(&mut linker, |state: &mut RunState| &mut state.wasi).map_err(
            |e| PlaygroundError::RuntimeInit(anyhow::anyhow!("failed to link WASI: {}", e)),
        )?;

        let instance = linker.instantiate(&mut store, module).map_err(|e| {
            if let Some(violation) = store.data().ceiling.violation("instantiation") {
                return violation;
            }
            PlaygroundError::ModuleLoad(anyhow::anyhow!("failed to instantiate: {}", e))
        })?;

        let start = instance
            .get_typed_func::<(), ()>(&mut store, "_start")
            .map_err(|e| {
                PlaygroundError::ModuleLoad(anyhow::anyhow!("failed to get _start function: {}", e))
            })?;

        let started = Instant::now();
        let outcome = start.call(&mut store, ());
        let duration = started.elapsed();

        let exit_code = match outcome {
            Ok(()) => 0,
            Err(e) => {
                if let Some(exit) = e.downcast_ref::<I32Exit>() {
                    exit.0
                } else if e.downcast_ref::<DeadlinePassed>().is_some() {
                    return Err(PlaygroundError::Timeout(config.timeout));
                } else if let Some(violation) = store.data().ceiling.violation("execution") {
                    return Err(violation);
                } else if e.downcast_ref::<Trap>() == Some(&Trap::OutOfFuel) {
                    return Err(PlaygroundError::OutOfFuel {
                        consumed: config.max_fuel,
                    });
                } else {
                    return Err(PlaygroundError::ExecutionFailed(e.to_string()));
                }
            }
        };

        tracing::debug!(exit_code, ?duration, "interpreter run finished");

        Ok(ExecutionResult {
            stdout: io.stdout_str(),
            stderr: io.stderr_str(),
            exit_code,
            metadata: ExecutionMetadata {
                duration,
                peak_memory: store.data().ceiling.peak_memory(),
            },
        })
    }
}

impl PythonRuntime for PythonSandbox {
    fn execute(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<ExecutionResult>> + Send {
        PythonSandbox::execute(self, code, None)
    }
}
