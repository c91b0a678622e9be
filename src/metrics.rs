//! Metric derivation
//!
//! This module derives the engagement rate from raw interaction counts:
//! `(likes + comments + shares) / views * 100`, rounded to 2 decimals.
//!
//! A post with zero views has an engagement rate of `0.0`. The same rule is
//! used for per-record rates and for rates recomputed from aggregated sums,
//! so no view ever sees `NaN` or an infinite rate.

use crate::schema::EngagementRecord;
use crate::types::MeasuredRecord;

/// Metric deriver for attaching engagement rates to records
pub struct MetricDeriver;

impl MetricDeriver {
    /// Derive engagement rates for a whole collection, preserving order
    pub fn derive(records: Vec<EngagementRecord>) -> Vec<MeasuredRecord> {
        records.into_iter().map(Self::measure).collect()
    }

    /// Derive the engagement rate of a single record
    pub fn measure(record: EngagementRecord) -> MeasuredRecord {
        let engagement_rate =
            engagement_rate(record.likes, record.comments, record.shares, record.views);
        MeasuredRecord {
            record,
            engagement_rate,
        }
    }
}

/// Engagement rate in percent, rounded to 2 decimals.
///
/// Returns `0.0` when `views == 0`. Rates above 100% are not clamped.
pub fn engagement_rate(likes: u64, comments: u64, shares: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    // Widened so that counts near u64::MAX cannot overflow
    let interactions = likes as u128 + comments as u128 + shares as u128;
    round2(interactions as f64 / views as f64 * 100.0)
}

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean, `None` for an empty input
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
