//! Retry policy and jittered exponential backoff

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use reqwest::Method;

/// When and how often a request is retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_interval: Duration,
    pub backoff_factor: f64,
    /// Fraction of the nominal delay added or removed at random (0.5 = ±50%)
    pub jitter: f64,
    /// Statuses treated as transient
    pub retry_statuses: Vec<u16>,
    /// Fixed seed for the jitter draw; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_interval: Duration::from_millis(50),
            backoff_factor: 2.0,
            jitter: 0.5,
            retry_statuses: vec![404, 500],
            seed: None,
        }
    }
}

impl RetryPolicy {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Whether a response with `status` may be retried for `method`
    ///
    /// Only idempotent methods are retried.
    pub fn should_retry(&self, method: &Method, status: u16) -> bool {
        is_idempotent(method) && self.retry_statuses.contains(&status)
    }
}

fn is_idempotent(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
        Method::TRACE,
    ]
    .contains(method)
}

/// Delay before retry number `retry` (counting from 1)
///
/// `draw` is a uniform sample in `[0, 1)`; 0.5 yields the nominal delay
/// `base * factor^(retry - 1)`, the extremes shift it by `±jitter`.
pub fn backoff_delay(retry: u32, base: Duration, factor: f64, jitter: f64, draw: f64) -> Duration {
    let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
    let nominal = base.as_secs_f64() * factor.powi(exponent);
    let offset = jitter * (2.0 * draw.clamp(0.0, 1.0) - 1.0);
    let secs = nominal * (1.0 + offset);
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Backoff schedule for one top-level call
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    rng: Pcg64Mcg,
}

impl<'a> Backoff<'a> {
    pub fn new(policy: &'a RetryPolicy) -> Self {
        let rng = match policy.seed {
            Some(seed) => Pcg64Mcg::seed_from_u64(seed),
            None => Pcg64Mcg::from_entropy(),
        };
        Self { policy, rng }
    }

    pub fn next_delay(&mut self, retry: u32) -> Duration {
        let draw = self.rng.gen_range(0.0..1.0);
        backoff_delay(
            retry,
            self.policy.base_interval,
            self.policy.backoff_factor,
            self.policy.jitter,
            draw,
        )
    }
}
