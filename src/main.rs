use std::process::ExitCode;

use anyhow::Result;
use checkin::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::error;

fn main() -> Result<ExitCode> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    });
    // Stdin reads block a worker thread that would otherwise keep the process alive.
    runtime.shutdown_background();
    result
}
