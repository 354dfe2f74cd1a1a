//! Search analytics
//!
//! A bounded in-memory log of search queries with simple rollups: top
//! queries by count and search counts per trailing window. Queries are
//! normalized to lowercase before logging.

use chrono::{Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::str::FromStr;

use crate::error::AppError;

/// One logged search
#[derive(Debug, Clone, Serialize)]
pub struct SearchLog {
    pub query: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Reporting window for analytics queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    All,
}

impl Period {
    /// Window start in epoch milliseconds, `None` for all time
    fn cutoff(&self, now_ms: i64) -> Option<i64> {
        let window = match self {
            Period::Day => Duration::days(1),
            Period::Week => Duration::weeks(1),
            Period::Month => Duration::days(30),
            Period::All => return None,
        };
        Some(now_ms - window.num_milliseconds())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            other => Err(AppError::Validation(format!(
                "Unknown analytics period \"{}\"",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Day => write!(f, "day"),
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
            Period::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCount {
    pub query: String,
    pub count: usize,
    pub last_searched: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodCounts {
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub all_time: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub period: String,
    pub total_searches: usize,
    pub unique_queries: usize,
    pub top_queries: Vec<QueryCount>,
    pub searches_by_period: PeriodCounts,
}

/// Bounded search log; the oldest entries are dropped beyond the cap
pub struct SearchAnalytics {
    logs: RwLock<VecDeque<SearchLog>>,
    max_entries: usize,
}

impl SearchAnalytics {
    pub fn new(max_entries: usize) -> Self {
        Self {
            logs: RwLock::new(VecDeque::new()),
            max_entries,
        }
    }

    /// Log a search query, normalized to lowercase
    pub fn log(&self, query: &str, user_agent: Option<String>) {
        let entry = SearchLog {
            query: query.trim().to_lowercase(),
            timestamp: Utc::now().timestamp_millis(),
            user_agent,
        };

        let mut logs = self.logs.write();
        logs.push_back(entry);
        while logs.len() > self.max_entries {
            logs.pop_front();
        }
    }

    /// Rollup for a reporting window: top-10 queries plus per-window totals
    pub fn report(&self, period: Period) -> SearchReport {
        let now = Utc::now().timestamp_millis();
        let logs = self.logs.read();

        let in_window: Vec<&SearchLog> = match period.cutoff(now) {
            Some(cutoff) => logs.iter().filter(|l| l.timestamp >= cutoff).collect(),
            None => logs.iter().collect(),
        };

        let mut stats: HashMap<&str, (usize, i64)> = HashMap::new();
        for log in &in_window {
            let entry = stats.entry(log.query.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 = entry.1.max(log.timestamp);
        }

        let mut top_queries: Vec<QueryCount> = stats
            .iter()
            .map(|(query, &(count, last_searched))| QueryCount {
                query: query.to_string(),
                count,
                last_searched,
            })
            .collect();
        top_queries.sort_by(|a, b| b.count.cmp(&a.count));
        top_queries.truncate(10);

        let count_since = |p: Period| match p.cutoff(now) {
            Some(cutoff) => logs.iter().filter(|l| l.timestamp >= cutoff).count(),
            None => logs.len(),
        };

        SearchReport {
            period: period.to_string(),
            total_searches: in_window.len(),
            unique_queries: stats.len(),
            top_queries,
            searches_by_period: PeriodCounts {
                today: count_since(Period::Day),
                this_week: count_since(Period::Week),
                this_month: count_since(Period::Month),
                all_time: logs.len(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }
}
