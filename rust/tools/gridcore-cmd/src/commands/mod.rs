//! Command implementations for gridcore-cmd

use std::future::Future;

use anyhow::{Context, Result};

pub mod bench;
pub mod generate;
pub mod stream;

/// Runs an async command on a fresh multi-threaded runtime.
pub fn block_on<F>(command: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "Failed to start the async runtime")?;
    runtime.block_on(command)
}
