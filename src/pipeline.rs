//! Pipeline orchestration
//!
//! This module provides the entry point the dashboard shell calls on every
//! interaction: filter the session's records, then compute every view.
//!
//! Pipeline stages:
//! 1. FilterEngine - Narrow the measured records to the selection
//! 2. Aggregator - KPIs, platform rollup, top themes, daily series, display rows
//!
//! Metric derivation happens once at load time (see [`crate::source`]). An
//! empty selection stops the pipeline before aggregation.

use std::sync::Arc;

use tracing::debug;

use crate::aggregate::{Aggregator, DEFAULT_DISPLAY_ROWS, DEFAULT_TOP_THEMES};
use crate::filter::FilterEngine;
use crate::source::Dataset;
use crate::types::{Dashboard, DashboardView, EmptyReason, FilterSpec, Kpis, MeasuredRecord};

/// Size limits for the ranked and projected views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub top_themes: usize,
    pub display_rows: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            top_themes: DEFAULT_TOP_THEMES,
            display_rows: DEFAULT_DISPLAY_ROWS,
        }
    }
}

/// Compute every dashboard view for one selection.
///
/// # Arguments
/// * `records` - Measured records of the session
/// * `filter` - The current selection
/// * `options` - Top-N and display row limits
///
/// # Returns
/// [`DashboardView::Empty`] when nothing is selected, otherwise all views
pub fn render_dashboard(
    records: &[MeasuredRecord],
    filter: &FilterSpec,
    options: &ViewOptions,
) -> DashboardView {
    if records.is_empty() {
        return DashboardView::empty(filter.clone(), EmptyReason::NoRecordsLoaded);
    }
    if filter.has_inverted_range() {
        return DashboardView::empty(filter.clone(), EmptyReason::InvertedDateRange);
    }

    // Stage 1: Filter
    let selected = FilterEngine::apply(records, filter);

    // Stage 2: Aggregate, starting with KPIs which detect the empty selection
    let kpis = match Aggregator::kpis(&selected) {
        Kpis::Ready(summary) => summary,
        Kpis::Empty => {
            debug!("no records match the selection");
            return DashboardView::empty(filter.clone(), EmptyReason::NoMatchingRecords);
        }
    };

    DashboardView::Ready(Dashboard {
        filter: filter.clone(),
        kpis,
        platforms: Aggregator::by_platform(&selected),
        top_themes: Aggregator::top_themes(&selected, options.top_themes),
        daily: Aggregator::daily_series(&selected),
        recent_posts: Aggregator::display_rows(&selected, options.display_rows),
    })
}

/// Session-scoped engine over a shared, read-only dataset.
///
/// Holds no per-selection state: each call to [`DashboardEngine::render`] is
/// an independent recompute.
#[derive(Debug, Clone)]
pub struct DashboardEngine {
    dataset: Arc<Dataset>,
    options: ViewOptions,
}

impl DashboardEngine {
    /// Create an engine with default view options
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self::with_options(dataset, ViewOptions::default())
    }

    pub fn with_options(dataset: Arc<Dataset>, options: ViewOptions) -> Self {
        Self { dataset, options }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Selection covering every category and the full date span
    pub fn default_filter(&self) -> Option<FilterSpec> {
        FilterSpec::all(self.dataset.dimensions())
    }

    /// Recompute the dashboard for `filter`
    pub fn render(&self, filter: &FilterSpec) -> DashboardView {
        render_dashboard(self.dataset.records(), filter, &self.options)
    }
}
