//! Outbound request budget
//!
//! The upstream explorer API allows 5 calls per second and 100,000 per day
//! on the free tier. `acquire` blocks until a per-second slot frees up and
//! fails once the daily budget is exhausted.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::{AppError, AppResult};

/// Slack added when waiting out the per-second window
const WAIT_BUFFER_MS: u64 = 50;

#[derive(Debug)]
struct BudgetState {
    /// Call instants inside the last second
    recent: VecDeque<Instant>,
    daily_count: u64,
    daily_reset: DateTime<Utc>,
}

/// Daily usage snapshot for the stats endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub daily_call_count: u64,
    pub max_daily_calls: u64,
    pub remaining_calls: u64,
    pub percentage_used: f64,
    pub resets_at: DateTime<Utc>,
}

/// Two-window rate limiter: N calls per second, M calls per day
pub struct RequestBudget {
    state: Mutex<BudgetState>,
    per_second: usize,
    per_day: u64,
}

impl RequestBudget {
    pub fn new(per_second: usize, per_day: u64) -> Self {
        Self {
            state: Mutex::new(BudgetState {
                recent: VecDeque::new(),
                daily_count: 0,
                daily_reset: Utc::now() + ChronoDuration::hours(24),
            }),
            per_second,
            per_day,
        }
    }

    /// Reserve a call slot, sleeping while the per-second window is full
    pub async fn acquire(&self) -> AppResult<()> {
        loop {
            let wait = self.try_reserve()?;
            match wait {
                None => return Ok(()),
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }

    /// Reserve immediately or report how long to wait
    fn try_reserve(&self) -> AppResult<Option<Duration>> {
        let mut state = self.state.lock();
        let now = Instant::now();

        if Utc::now() >= state.daily_reset {
            state.daily_count = 0;
            state.daily_reset = Utc::now() + ChronoDuration::hours(24);
            tracing::info!("Daily request budget reset");
        }

        if state.daily_count >= self.per_day {
            return Err(AppError::Upstream(
                "daily API request budget exhausted".to_string(),
            ));
        }

        while let Some(front) = state.recent.front() {
            if now.duration_since(*front) >= Duration::from_secs(1) {
                state.recent.pop_front();
            } else {
                break;
            }
        }

        if state.recent.len() >= self.per_second {
            let oldest = *state.recent.front().unwrap_or(&now);
            let elapsed = now.duration_since(oldest);
            let wait = Duration::from_secs(1).saturating_sub(elapsed)
                + Duration::from_millis(WAIT_BUFFER_MS);
            return Ok(Some(wait));
        }

        state.recent.push_back(now);
        state.daily_count += 1;
        Ok(None)
    }

    pub fn usage(&self) -> UsageStats {
        let state = self.state.lock();
        UsageStats {
            daily_call_count: state.daily_count,
            max_daily_calls: self.per_day,
            remaining_calls: self.per_day.saturating_sub(state.daily_count),
            percentage_used: (state.daily_count as f64 / self.per_day as f64) * 100.0,
            resets_at: state.daily_reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_within_budget() {
        let budget = RequestBudget::new(5, 100);
        for _ in 0..5 {
            budget.acquire().await.unwrap();
        }
        assert_eq!(budget.usage().daily_call_count, 5);
    }

    #[tokio::test]
    async fn test_daily_budget_exhaustion() {
        let budget = RequestBudget::new(100, 2);
        budget.acquire().await.unwrap();
        budget.acquire().await.unwrap();

        let err = budget.try_reserve().unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_per_second_window_reports_wait() {
        let budget = RequestBudget::new(2, 1000);
        assert!(budget.try_reserve().unwrap().is_none());
        assert!(budget.try_reserve().unwrap().is_none());
        // Third call in the same second must wait
        assert!(budget.try_reserve().unwrap().is_some());
    }

    #[test]
    fn test_usage_stats() {
        let budget = RequestBudget::new(5, 1000);
        budget.try_reserve().unwrap();
        let stats = budget.usage();
        assert_eq!(stats.daily_call_count, 1);
        assert_eq!(stats.remaining_calls, 999);
        assert!(stats.percentage_used > 0.0);
    }
}
