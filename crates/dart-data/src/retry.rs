//! 제한된 횟수의 재시도 래퍼.
//!
//! 단일 네트워크 호출을 감싸 일시적 실패([`crate::DataError::is_retryable`])만
//! 지수 백오프로 재시도합니다. 나머지 에러는 즉시 반환됩니다.

use std::future::Future;
use std::time::Duration;

use dart_core::RetrySettings;
use tracing::{debug, warn};

use crate::error::Result;

/// 재시도 정책.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함, 최소 1)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 시간
    pub initial_delay: Duration,
    /// 재시도마다 곱해지는 배수
    pub backoff_factor: u32,
    /// 최대 대기 시간
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            backoff_factor: settings.backoff_factor.max(1),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// 대기 없이 즉시 재시도하는 정책 (테스트용).
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::ZERO,
            backoff_factor: 1,
            max_delay: Duration::ZERO,
        }
    }

    /// `attempt`번째 시도가 실패한 뒤의 대기 시간 (1부터 시작).
    ///
    /// 1000ms, 배수 2 → 1000ms, 2000ms, 4000ms, ... (`max_delay`에서 잘림)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = self.backoff_factor.saturating_pow(exponent);
        self.initial_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// `operation`을 정책에 따라 재시도합니다.
///
/// 재시도 불가능한 에러는 즉시, 재시도 가능한 에러는 시도 횟수를 모두
/// 소진한 뒤 마지막 에러를 반환합니다.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                debug!(
                    operation = operation,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "재시도 예정"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!(
                        operation = operation,
                        attempts = attempt,
                        error = %e,
                        "재시도 횟수 소진"
                    );
                } else {
                    warn!(operation = operation, error = %e, "재시도 불가 에러");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_backoff() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            backoff_factor: 2,
            max_delay: Duration::from_millis(5000),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = retry(&RetryPolicy::default(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(DataError::Timeout("first".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&RetryPolicy::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DataError::Network("down".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(DataError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_fatal_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&RetryPolicy::immediate(5), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DataError::Unauthorized {
                    status: "010".to_string(),
                    message: "등록되지 않은 키입니다.".to_string(),
                })
            }
        })
        .await;

        assert!(result.unwrap_err().is_fatal());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
