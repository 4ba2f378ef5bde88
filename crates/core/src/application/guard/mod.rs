// Panic isolation for job execution
use std::any::Any;
use std::future::Future;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked (or its task was cancelled)
    Panicked(String),
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Execute a future with panic isolation
///
/// The future runs on its own tokio task so that a panic inside the job
/// executor unwinds that task only and comes back as a `JoinError`.
///
/// # Example
/// ```text
/// let result = execute_guarded_async(async move { executor.run(seq).await }).await;
/// match result {
///     PanicGuardResult::Panicked(msg) => println!("Caught panic: {}", msg),
///     PanicGuardResult::Success(outcome) => println!("{}", outcome),
/// }
/// ```
pub async fn execute_guarded_async<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn(future).await {
        Ok(result) => PanicGuardResult::Success(result),
        Err(join_err) => {
            let panic_msg = if join_err.is_panic() {
                panic_message(join_err.into_panic().as_ref())
            } else {
                "Task cancelled".to_string()
            };

            error!(panic_msg = %panic_msg, "Job task panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}
