//! Bounded retry with an explicit inter-attempt delay.
//!
//! Used by the promotion attempt loop and by inventory listing. The delay
//! policy is data, so tests run the same loop with `Backoff::None`.

use std::future::Future;
use std::time::Duration;

/// Delay between a failed attempt and the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Same delay after every failure.
    Fixed(Duration),
    /// `base * 2^(attempt - 1)` after the given failed attempt.
    Exponential { base: Duration },
}

impl Backoff {
    /// Delay to wait after `attempt` (1-based) failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => *delay,
            Self::Exponential { base } => {
                let exp = attempt.saturating_sub(1).min(16);
                base.saturating_mul(1u32 << exp)
            }
        }
    }
}

/// Attempt budget plus delay policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; never less than one.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// A value together with the number of attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Promotion default: 3 attempts, 5 s apart.
    pub fn promotion_default() -> Self {
        Self::new(3, Backoff::Fixed(Duration::from_secs(5)))
    }

    /// Inventory listing default: 3 attempts, 1 s then 2 s.
    pub fn inventory_default() -> Self {
        Self::new(
            3,
            Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        )
    }

    /// No delay between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Backoff::None)
    }

    /// Run `op` until it succeeds, the budget is spent, or `on_error`
    /// returns `false` for a failure.
    ///
    /// `op` receives the 1-based attempt number. `on_error` sees every
    /// failure before the delay is taken.
    pub async fn run<T, E, F, Fut, H>(&self, mut op: F, mut on_error: H) -> Result<Attempted<T>, Attempted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        H: FnMut(u32, &E) -> bool,
    {
        let budget = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        attempts: attempt,
                    })
                }
                Err(err) => {
                    let keep_going = on_error(attempt, &err);
                    if !keep_going || attempt >= budget {
                        return Err(Attempted {
                            value: err,
                            attempts: attempt,
                        });
                    }
                    let delay = self.backoff.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::promotion_default()
    }
}
