//! Bridge for driving async client calls from synchronous callers.
//!
//! The step engine runs strictly sequentially and calls the resource API
//! synchronously. This helper reuses the ambient multi-threaded Tokio runtime
//! when there is one and otherwise runs the future on a dedicated
//! current-thread runtime.

use std::future::Future;
use std::thread;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio::task;

use crate::ApiError;

/// Run `future` to completion and return its output.
///
/// - Inside a multi-threaded runtime the current worker is moved off the
///   scheduler with `block_in_place` before blocking.
/// - Inside a current-thread runtime blocking the only worker would stall it,
///   so the future is driven on a helper thread instead.
/// - Outside any runtime a fresh current-thread runtime is built.
pub fn block_on<F, T>(future: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
    T: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => task::block_in_place(|| handle.block_on(future)),
        Ok(_) => thread::spawn(move || run_on_fresh_runtime(future))
            .join()
            .map_err(|_| ApiError::Runtime("blocking bridge thread panicked".into()))?,
        Err(_) => run_on_fresh_runtime(future),
    }
}

fn run_on_fresh_runtime<F, T>(future: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ApiError::Runtime(error.to_string()))?
        .block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_future_without_ambient_runtime() {
        let value = block_on(async { Ok::<_, ApiError>(41 + 1) }).expect("future output");
        assert_eq!(value, 42);
    }

    #[test]
    fn propagates_future_errors() {
        let error = block_on(async { Err::<(), _>(ApiError::MissingAccessToken) }).expect_err("error propagates");
        assert!(matches!(error, ApiError::MissingAccessToken));
    }

    #[tokio::test]
    async fn does_not_stall_current_thread_runtime() {
        let value = block_on(async { Ok::<_, ApiError>("done") }).expect("future output");
        assert_eq!(value, "done");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reuses_multi_thread_runtime() {
        let value = block_on(async {
            tokio::task::yield_now().await;
            Ok::<_, ApiError>(7)
        })
        .expect("future output");
        assert_eq!(value, 7);
    }
}
