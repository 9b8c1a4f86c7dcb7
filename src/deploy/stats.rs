// ABOUTME: Aggregate counters over a set of deployments.
// ABOUTME: Success rate, average duration, and recent activity for dashboards.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::DeploymentStatus;

use super::Deployment;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeploymentStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub successful: usize,
    pub failed: usize,
    pub rolled_back: usize,
    pub cancelled: usize,
    /// Percentage of all deployments currently in `success`.
    pub success_rate: f64,
    /// Mean `duration_seconds` across all deployments, including unfinished ones.
    pub average_duration_seconds: f64,
    pub created_this_week: usize,
    pub created_today: usize,
}

impl DeploymentStats {
    pub fn collect(deployments: &[Deployment], now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(7);
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(now);

        let mut stats = Self {
            total: deployments.len(),
            ..Default::default()
        };
        let mut total_duration: u64 = 0;

        for d in deployments {
            match d.status {
                DeploymentStatus::Pending => stats.pending += 1,
                DeploymentStatus::InProgress => stats.in_progress += 1,
                DeploymentStatus::Success => stats.successful += 1,
                DeploymentStatus::Failed => stats.failed += 1,
                DeploymentStatus::RolledBack => stats.rolled_back += 1,
                DeploymentStatus::Cancelled => stats.cancelled += 1,
            }
            total_duration += d.duration_seconds;
            if d.created_at >= week_ago {
                stats.created_this_week += 1;
            }
            if d.created_at >= midnight {
                stats.created_today += 1;
            }
        }

        if stats.total > 0 {
            stats.success_rate = stats.successful as f64 * 100.0 / stats.total as f64;
            stats.average_duration_seconds = total_duration as f64 / stats.total as f64;
        }

        stats
    }
}
