//! Bounded linear backoff for connection attempts.
//!
//! After failed attempt `k` the provider sleeps `backoff_factor * k` units
//! before trying again. No sleep follows the final attempt, so with three
//! attempts and a factor of one the total wait is `1 + 2 = 3` units.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;
const DEFAULT_UNIT: Duration = Duration::from_secs(1);

/// Retry settings of a remote provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, at least one.
    pub max_attempts: u32,
    pub backoff_factor: f64,
    /// Length of one backoff unit.
    #[serde(with = "duration_ms")]
    pub unit: Duration,
}

/// The `retry` block as written in a provider config.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RetrySection {
    max_attempts: Option<u64>,
    backoff_factor: Option<f64>,
    unit_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            unit: DEFAULT_UNIT,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_factor: f64, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_factor: sanitize_factor(backoff_factor),
            unit,
        }
    }

    /// Read `retry.max_attempts`, `retry.backoff_factor` and `retry.unit_ms`
    /// from a provider's config block. A missing or malformed section keeps
    /// the defaults.
    pub fn from_config(config: &Value) -> Self {
        let defaults = Self::default();
        let section = config
            .get("retry")
            .and_then(|retry| RetrySection::deserialize(retry).ok())
            .unwrap_or_default();

        Self::new(
            section
                .max_attempts
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(defaults.max_attempts),
            section.backoff_factor.unwrap_or(defaults.backoff_factor),
            section.unit_ms.map(Duration::from_millis).unwrap_or(defaults.unit),
        )
    }

    /// Sleep after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let seconds = self.unit.as_secs_f64() * self.backoff_factor * f64::from(attempt);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }

    /// Sum of every sleep taken when all attempts fail.
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .map(|attempt| self.delay_after(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

fn sanitize_factor(factor: f64) -> f64 {
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        0.0
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::from_config(&json!({}));
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.total_backoff(), Duration::from_secs(3));
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new(4, 0.5, Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(50));
        assert_eq!(policy.delay_after(3), Duration::from_millis(150));
        assert_eq!(policy.total_backoff(), Duration::from_millis(300));
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from_config(&json!({
            "retry": {"max_attempts": 5, "backoff_factor": 2, "unit_ms": 10}
        }));
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_factor, 2.0);
        assert_eq!(policy.delay_after(2), Duration::from_millis(40));
    }

    #[test]
    fn test_degenerate_values_are_clamped() {
        let policy = RetryPolicy::from_config(&json!({
            "retry": {"max_attempts": 0, "backoff_factor": -1.0}
        }));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff_factor, 0.0);
        assert_eq!(policy.total_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_malformed_section_keeps_defaults() {
        let policy = RetryPolicy::from_config(&json!({"retry": {"max_attempts": "many"}}));
        assert_eq!(policy, RetryPolicy::default());
        let policy = RetryPolicy::from_config(&json!({"retry": 5}));
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_serializes_unit_as_millis() {
        let policy = RetryPolicy::new(3, 1.0, Duration::from_millis(250));
        assert_eq!(
            serde_json::to_value(policy).unwrap(),
            json!({"max_attempts": 3, "backoff_factor": 1.0, "unit": 250})
        );
    }
}
