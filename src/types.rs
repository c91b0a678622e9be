//! Core types for the engagement engine
//!
//! This module defines the data structures that flow through each stage of
//! the dashboard: measured records, the filter selection, the aggregate views
//! and the encoded snapshot payload.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::Dimensions;
use crate::metrics::MetricDeriver;
use crate::schema::EngagementRecord;

/// An engagement record paired with its derived engagement rate.
///
/// Only [`crate::metrics::MetricDeriver`] constructs these, so the rate always
/// matches the counts of the wrapped record. Deserializing reads the record
/// and recomputes the rate; a serialized `engagement_rate` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasuredRecord {
    #[serde(flatten)]
    pub(crate) record: EngagementRecord,
    pub(crate) engagement_rate: f64,
}

impl MeasuredRecord {
    pub fn record(&self) -> &EngagementRecord {
        &self.record
    }

    /// Engagement rate in percent, rounded to 2 decimals
    pub fn engagement_rate(&self) -> f64 {
        self.engagement_rate
    }
}

impl<'de> Deserialize<'de> for MeasuredRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        EngagementRecord::deserialize(deserializer).map(MetricDeriver::measure)
    }
}

/// The user-selected view window.
///
/// Every predicate must hold for a record to pass. An empty category set
/// selects nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// First day included (inclusive)
    pub date_from: NaiveDate,
    /// Last day included (inclusive)
    pub date_to: NaiveDate,
    pub platforms: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub themes: BTreeSet<String>,
}

impl FilterSpec {
    /// Create a date window with no categories selected
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        FilterSpec {
            date_from,
            date_to,
            platforms: BTreeSet::new(),
            regions: BTreeSet::new(),
            themes: BTreeSet::new(),
        }
    }

    /// Select every value present in the catalog over its whole date span.
    ///
    /// Returns `None` when the catalog was built from an empty collection.
    pub fn all(dimensions: &Dimensions) -> Option<Self> {
        let (first, last) = dimensions.date_range()?;
        Some(
            FilterSpec::new(first, last)
                .with_platforms(dimensions.platforms.iter().cloned())
                .with_regions(dimensions.regions.iter().cloned())
                .with_themes(dimensions.themes.iter().cloned()),
        )
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_themes<I, S>(mut self, themes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.themes = themes.into_iter().map(Into::into).collect();
        self
    }

    /// True when `date_from` falls after `date_to`
    pub fn has_inverted_range(&self) -> bool {
        self.date_from > self.date_to
    }
}

/// Headline numbers for the filtered selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_views: u64,
    /// Mean likes per post, floored to a whole number
    pub avg_likes: u64,
    /// Mean of per-post engagement rates (percent)
    pub avg_engagement: f64,
    pub total_posts: usize,
}

/// KPI outcome. An empty selection has no meaningful averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Kpis {
    Empty,
    Ready(KpiSummary),
}

impl Kpis {
    pub fn summary(&self) -> Option<&KpiSummary> {
        match self {
            Kpis::Empty => None,
            Kpis::Ready(summary) => Some(summary),
        }
    }
}

/// Per-platform rollup row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRollup {
    pub platform: String,
    pub posts: usize,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    /// Mean of per-post engagement rates (percent)
    pub engagement_rate: f64,
}

/// Per-theme rollup row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeRollup {
    pub content_theme: String,
    pub posts: usize,
    pub views: u64,
    /// Mean of per-post engagement rates (percent)
    pub engagement_rate: f64,
}

/// Per-day rollup row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub posts: usize,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    /// Engagement rate recomputed from the daily sums (percent)
    pub engagement_rate: f64,
}

/// Display-ready record row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    /// Timestamp formatted as `YYYY-MM-DD HH:MM`
    pub timestamp: String,
    pub platform: String,
    pub region: String,
    pub content_theme: String,
    pub views: u64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub engagement_rate: f64,
}

/// Every view of a non-empty selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub filter: FilterSpec,
    pub kpis: KpiSummary,
    pub platforms: Vec<PlatformRollup>,
    pub top_themes: Vec<ThemeRollup>,
    pub daily: Vec<DailyRollup>,
    pub recent_posts: Vec<DisplayRow>,
}

/// Why a selection produced no dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The source table holds no valid records
    NoRecordsLoaded,
    /// `date_from` is after `date_to`
    InvertedDateRange,
    /// Nothing survives the selected filters
    NoMatchingRecords,
}

impl EmptyReason {
    /// Message suitable for showing to the user
    pub fn message(&self) -> &'static str {
        match self {
            EmptyReason::NoRecordsLoaded => "No data available: the source table has no valid records.",
            EmptyReason::InvertedDateRange => {
                "No data available: the start date is after the end date."
            }
            EmptyReason::NoMatchingRecords => {
                "No data available for the selected filters. Please adjust your selection."
            }
        }
    }
}

/// Result of one dashboard recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardView {
    Empty {
        filter: FilterSpec,
        reason: EmptyReason,
        message: String,
    },
    Ready(Dashboard),
}

impl DashboardView {
    pub(crate) fn empty(filter: FilterSpec, reason: EmptyReason) -> Self {
        DashboardView::Empty {
            filter,
            reason,
            message: reason.message().to_string(),
        }
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        match self {
            DashboardView::Empty { .. } => None,
            DashboardView::Ready(dashboard) => Some(dashboard),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DashboardView::Empty { .. })
    }
}

/// Snapshot producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Snapshot provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProvenance {
    pub source_path: String,
    pub data_origin: String,
    pub records_loaded: usize,
    pub rows_rejected: usize,
    pub computed_at_utc: String,
}

/// Complete encoded dashboard payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub snapshot_version: String,
    pub producer: SnapshotProducer,
    pub provenance: SnapshotProvenance,
    pub dashboard: DashboardView,
}
