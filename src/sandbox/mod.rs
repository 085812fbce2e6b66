//! The RustPython-on-wasmtime runtime and its supporting pieces.

pub mod config;
pub mod executor;
pub mod io;
pub mod limits;
