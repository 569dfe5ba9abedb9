//! Timeout enforcement.
//!
//! Every attempt has a deadline. An expired deadline is reported as a
//! `TimedOut` transport error so the retry classifier treats it as transient.

use std::future::Future;
use std::time::Duration;

use crate::error::{ApiError, ApiResult, TransportErrorCode};

/// Run `future`, failing with a timed-out transport error after `deadline`.
pub async fn with_deadline<T, F>(deadline: Duration, future: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::transport(
            TransportErrorCode::TimedOut,
            format!("request timeout after {} ms", deadline.as_millis()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let result: ApiResult<()> = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport { code: TransportErrorCode::TimedOut, .. }
        ));
        assert!(err.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_through_result() {
        let ok = with_deadline(Duration::from_secs(1), async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = with_deadline(Duration::from_secs(1), async {
            Err::<(), _>(ApiError::Http { status: 404, message: "Not Found".into() })
        })
        .await;
        assert_eq!(err.unwrap_err().status(), Some(404));
    }
}
