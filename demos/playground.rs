//! Drive a playground from the terminal.
//!
//! Run with: cargo run --example playground [-- path/to/script.py ...]
//!
//! Each file given on the command line is loaded into the editor and
//! evaluated in turn; with no arguments the default snippet is run.
//!
//! Note: Requires rustpython.wasm to be present in assets/

use std::time::Duration;

use python_playground_rs::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let sandbox = SandboxConfig::builder()
        .timeout(Duration::from_secs(5))
        .max_memory(32 * 1024 * 1024)
        .interpreter_path("assets/rustpython.wasm")
        .build();

    let playground = Playground::with_sandbox("code", EditorConfig::default(), sandbox)?;
    print!("{}", playground.transcript());

    if let Err(e) = playground.session().wait_ready().await {
        eprintln!("{}", e);
        eprintln!("Make sure rustpython.wasm is present in the assets/ directory");
        return Err(e);
    }

    let scripts: Vec<String> = std::env::args().skip(1).collect();
    if scripts.is_empty() {
        playground.evaluate().await?;
    }
    for path in &scripts {
        playground.editor().set_text(std::fs::read_to_string(path)?);
        playground.evaluate().await?;
    }

    print!("{}", playground.transcript());
    Ok(())
}
