//! Fixed-count retry loop.

use std::future::Future;
use tracing::{error, info};

use crate::{AttemptError, RequestError};

/// Runs `attempt` up to `retries` times, retrying immediately on failure.
///
/// Each failed attempt is logged. Only the final failure is returned, wrapped
/// together with the URL and the number of attempts made.
pub(crate) async fn retry_fixed<T, F, Fut>(
    url: &str,
    retries: u32,
    mut attempt: F,
) -> Result<T, RequestError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let retries = retries.max(1);
    let mut number = 1;

    loop {
        match attempt(number).await {
            Ok(value) => return Ok(value),
            Err(cause) => {
                error!(url, attempt = number, of = retries, error = %cause, "request failed");
                if number >= retries {
                    return Err(RequestError::Exhausted {
                        url: url.to_string(),
                        attempts: number,
                        source: cause,
                    });
                }
                info!(url, next_attempt = number + 1, "retrying");
                number += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn status_error(status: u16) -> AttemptError {
        AttemptError::Status {
            status,
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        for retries in 1..=5u32 {
            let calls = Cell::new(0u32);
            let result = retry_fixed("http://test/x", retries, |n| {
                calls.set(calls.get() + 1);
                async move {
                    if n < retries {
                        Err(status_error(503))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

            assert_eq!(result.unwrap(), retries);
            assert_eq!(calls.get(), retries);
        }
    }

    #[tokio::test]
    async fn test_exhausted_wraps_last_cause() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry_fixed("http://test/x", 3, |n| {
            calls.set(calls.get() + 1);
            async move { Err(status_error(500 + n as u16)) }
        })
        .await;

        assert_eq!(calls.get(), 3);
        match result {
            Err(RequestError::Exhausted {
                url,
                attempts,
                source,
            }) => {
                assert_eq!(url, "http://test/x");
                assert_eq!(attempts, 3);
                assert!(matches!(source, AttemptError::Status { status: 503, .. }));
            }
            other => panic!("expected exhausted error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stops_after_first_success() {
        let calls = Cell::new(0u32);
        let result = retry_fixed("http://test/x", 4, |_| {
            calls.set(calls.get() + 1);
            async { Ok::<_, AttemptError>("body") }
        })
        .await;

        assert_eq!(result.unwrap(), "body");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_still_attempts_once() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry_fixed("http://test/x", 0, |_| {
            calls.set(calls.get() + 1);
            async { Err(AttemptError::Unexpected("boom".to_string())) }
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(
            result,
            Err(RequestError::Exhausted { attempts: 1, .. })
        ));
    }
}
