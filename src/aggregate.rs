//! Aggregation
//!
//! Reduces a filtered, measured collection into the dashboard views:
//! - KPI summary
//! - Per-platform rollup
//! - Per-theme top-N rollup
//! - Per-day time series
//! - Display projection of the most recent posts
//!
//! Every operation is a pure function of its input. Group keys are emitted in
//! lexicographic order (dates ascending).

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::metrics::{engagement_rate, mean};
use crate::types::{
    DailyRollup, DisplayRow, KpiSummary, Kpis, MeasuredRecord, PlatformRollup, ThemeRollup,
};

/// Default number of themes kept by [`Aggregator::top_themes`]
pub const DEFAULT_TOP_THEMES: usize = 5;

/// Default number of rows kept by [`Aggregator::display_rows`]
pub const DEFAULT_DISPLAY_ROWS: usize = 10;

/// Timestamp layout of display rows
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Aggregator for computing dashboard views
pub struct Aggregator;

impl Aggregator {
    /// Headline KPIs. An empty collection yields [`Kpis::Empty`].
    pub fn kpis(records: &[MeasuredRecord]) -> Kpis {
        let Some(avg_engagement) = mean(records.iter().map(MeasuredRecord::engagement_rate))
        else {
            return Kpis::Empty;
        };

        let total_posts = records.len();
        let total_views = saturating_sum(records.iter().map(|m| m.record().views));
        let total_likes = saturating_sum(records.iter().map(|m| m.record().likes));

        Kpis::Ready(KpiSummary {
            total_views,
            // Integer division floors the mean
            avg_likes: total_likes / total_posts as u64,
            avg_engagement,
            total_posts,
        })
    }

    /// One row per platform present in the input
    pub fn by_platform(records: &[MeasuredRecord]) -> Vec<PlatformRollup> {
        group_by(records, |m| m.record().platform.as_str())
            .into_iter()
            .map(|(platform, bucket)| PlatformRollup {
                platform: platform.to_string(),
                posts: bucket.posts,
                views: bucket.views,
                likes: bucket.likes,
                comments: bucket.comments,
                shares: bucket.shares,
                engagement_rate: bucket.mean_rate(),
            })
            .collect()
    }

    /// Themes ranked by mean engagement rate, truncated to `top_n`.
    ///
    /// Ties are broken by higher total views, then by theme name.
    pub fn top_themes(records: &[MeasuredRecord], top_n: usize) -> Vec<ThemeRollup> {
        let mut themes: Vec<ThemeRollup> = group_by(records, |m| m.record().content_theme.as_str())
            .into_iter()
            .map(|(theme, bucket)| ThemeRollup {
                content_theme: theme.to_string(),
                posts: bucket.posts,
                views: bucket.views,
                engagement_rate: bucket.mean_rate(),
            })
            .collect();

        themes.sort_by(|a, b| {
            b.engagement_rate
                .total_cmp(&a.engagement_rate)
                .then_with(|| b.views.cmp(&a.views))
                .then_with(|| a.content_theme.cmp(&b.content_theme))
        });
        themes.truncate(top_n);
        themes
    }

    /// Daily sums with the engagement rate recomputed from those sums
    pub fn daily_series(records: &[MeasuredRecord]) -> Vec<DailyRollup> {
        group_by(records, |m| m.record().date())
            .into_iter()
            .map(|(date, bucket)| daily_row(date, &bucket))
            .collect()
    }

    /// The `n_rows` most recent posts, newest first
    pub fn display_rows(records: &[MeasuredRecord], n_rows: usize) -> Vec<DisplayRow> {
        let mut ordered: Vec<&MeasuredRecord> = records.iter().collect();
        // Stable: posts sharing a timestamp keep their input order
        ordered.sort_by(|a, b| b.record().timestamp.cmp(&a.record().timestamp));

        ordered
            .into_iter()
            .take(n_rows)
            .map(|m| {
                let record = m.record();
                DisplayRow {
                    timestamp: record.timestamp.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
                    platform: record.platform.clone(),
                    region: record.region.clone(),
                    content_theme: record.content_theme.clone(),
                    views: record.views,
                    likes: record.likes,
                    shares: record.shares,
                    comments: record.comments,
                    engagement_rate: m.engagement_rate(),
                }
            })
            .collect()
    }
}

/// Running sums for one group
#[derive(Debug, Default)]
struct Bucket {
    posts: usize,
    views: u64,
    likes: u64,
    comments: u64,
    shares: u64,
    rate_sum: f64,
}

impl Bucket {
    fn add(&mut self, measured: &MeasuredRecord) {
        let record = measured.record();
        self.posts += 1;
        self.views = self.views.saturating_add(record.views);
        self.likes = self.likes.saturating_add(record.likes);
        self.comments = self.comments.saturating_add(record.comments);
        self.shares = self.shares.saturating_add(record.shares);
        self.rate_sum += measured.engagement_rate();
    }

    fn mean_rate(&self) -> f64 {
        if self.posts == 0 {
            return 0.0;
        }
        self.rate_sum / self.posts as f64
    }
}

/// Counts saturate at `u64::MAX` instead of wrapping
fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

fn group_by<'a, K, F>(records: &'a [MeasuredRecord], key: F) -> BTreeMap<K, Bucket>
where
    K: Ord,
    F: Fn(&'a MeasuredRecord) -> K,
{
    let mut groups: BTreeMap<K, Bucket> = BTreeMap::new();
    for measured in records {
        groups.entry(key(measured)).or_default().add(measured);
    }
    groups
}

fn daily_row(date: NaiveDate, bucket: &Bucket) -> DailyRollup {
    DailyRollup {
        date,
        posts: bucket.posts,
        views: bucket.views,
        likes: bucket.likes,
        comments: bucket.comments,
        shares: bucket.shares,
        engagement_rate: engagement_rate(
            bucket.likes,
            bucket.comments,
            bucket.shares,
            bucket.views,
        ),
    }
}
