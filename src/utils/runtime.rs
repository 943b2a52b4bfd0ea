use anyhow::Result;

/// Everything runs on one thread: timer ticks, simulated uploads and storage access never
/// interleave with each other mid-step.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
