//! Bounded retry with linear backoff.

use std::thread;
use std::time::Duration;

/// Retry policy: up to `max_attempts` tries with a linearly growing delay
/// between them. The first retry waits `base_delay`, the second
/// `2 * base_delay`, and so on.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three attempts with a 2 second base delay.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` must be at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        assert!(max_attempts > 0, "max_attempts must be greater than 0");
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Maximum number of attempts before giving up.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the retry that follows a failed `attempt` (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `operation` until it succeeds or the attempt cap is reached.
    ///
    /// The closure receives the 1-based attempt number. Returns the value
    /// together with the attempt that produced it, or the final error
    /// together with the number of attempts consumed.
    pub fn run<T, E>(
        &self,
        mut operation: impl FnMut(u32) -> Result<T, E>,
    ) -> Result<(T, u32), (E, u32)> {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok((value, attempt)),
                Err(err) if attempt >= self.max_attempts => return Err((err, attempt)),
                Err(_) => {
                    thread::sleep(self.delay_after(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn default_schedule_is_two_then_four_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
    }

    #[test]
    fn first_attempt_success_runs_once() {
        let policy = instant_policy(3);
        let mut calls = 0;
        let result: Result<(i32, u32), ((), u32)> = policy.run(|_| {
            calls += 1;
            Ok(42)
        });
        assert_eq!(result.unwrap(), (42, 1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn succeeds_on_final_attempt() {
        let policy = instant_policy(3);
        let result: Result<(&str, u32), (&str, u32)> = policy.run(|attempt| {
            if attempt < 3 {
                Err("transient")
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), ("done", 3));
    }

    #[test]
    fn exhaustion_reports_attempt_cap() {
        let policy = instant_policy(3);
        let mut calls = 0;
        let result: Result<((), u32), (&str, u32)> = policy.run(|_| {
            calls += 1;
            Err("still broken")
        });
        assert_eq!(result.unwrap_err(), ("still broken", 3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn backoff_delays_accumulate_across_retries() {
        // Two failed attempts before success: waits base + 2*base.
        let base = Duration::from_millis(30);
        let policy = RetryPolicy::new(3, base);
        let started = Instant::now();
        let result: Result<((), u32), ((), u32)> =
            policy.run(|attempt| if attempt < 3 { Err(()) } else { Ok(()) });
        let elapsed = started.elapsed();
        assert_eq!(result.unwrap().1, 3);
        assert!(
            elapsed >= base * 3,
            "expected at least {:?} of backoff, got {:?}",
            base * 3,
            elapsed
        );
    }
}
