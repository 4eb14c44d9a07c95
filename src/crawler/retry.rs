//! Escalating retry policy for targeted retries

use crate::config::RetryTierConfig;
use std::future::Future;
use std::time::Duration;

/// One escalation step: `retries` attempts, each followed by `wait` on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTier {
    pub wait: Duration,
    pub retries: u32,
}

/// Ordered escalation tiers, least patient first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    tiers: Vec<RetryTier>,
}

/// Final value of a retried operation and how many attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(tiers: Vec<RetryTier>) -> Self {
        Self { tiers }
    }

    pub fn from_config(tiers: &[RetryTierConfig]) -> Self {
        Self::new(
            tiers
                .iter()
                .map(|tier| RetryTier {
                    wait: Duration::from_millis(tier.wait),
                    retries: tier.retries,
                })
                .collect(),
        )
    }

    pub fn tiers(&self) -> &[RetryTier] {
        &self.tiers
    }

    /// Number of attempts before a unit is abandoned (at least one)
    pub fn total_attempts(&self) -> u32 {
        self.tiers.iter().map(|tier| tier.retries).sum::<u32>().max(1)
    }

    /// Runs `attempt` until `is_success` accepts its value or every tier is exhausted
    ///
    /// Attempts are numbered from 1. An `Err` from `attempt` stops the
    /// policy immediately and is returned as-is.
    pub async fn run<T, E, F, Fut>(
        &self,
        mut attempt: F,
        is_success: impl Fn(&T) -> bool,
    ) -> Result<Retried<T>, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut schedule = self
            .tiers
            .iter()
            .enumerate()
            .flat_map(|(index, tier)| (0..tier.retries).map(move |_| (index + 1, tier.wait)))
            .peekable();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let value = attempt(attempts).await?;
            let step = schedule.next();

            if is_success(&value) || schedule.peek().is_none() {
                return Ok(Retried { value, attempts });
            }

            if let Some((tier, wait)) = step {
                tracing::debug!(
                    "Attempt {} failed (tier {}), waiting {}ms",
                    attempts,
                    tier,
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&crate::config::default_retry_tiers())
    }
}
