//! Filter engine
//!
//! Applies a [`FilterSpec`] to a measured collection. The result keeps the
//! relative order of the input and never mutates it.

use tracing::debug;

use crate::schema::EngagementRecord;
use crate::types::{FilterSpec, MeasuredRecord};

/// Filter engine for narrowing a collection to the selected window
pub struct FilterEngine;

impl FilterEngine {
    /// Return the records satisfying every predicate of `spec`.
    ///
    /// An inverted date range yields an empty collection.
    pub fn apply(records: &[MeasuredRecord], spec: &FilterSpec) -> Vec<MeasuredRecord> {
        if spec.has_inverted_range() {
            debug!(
                date_from = %spec.date_from,
                date_to = %spec.date_to,
                "inverted date range selects nothing"
            );
            return Vec::new();
        }

        let filtered: Vec<MeasuredRecord> = records
            .iter()
            .filter(|m| Self::matches(m.record(), spec))
            .cloned()
            .collect();

        debug!(
            input = records.len(),
            output = filtered.len(),
            "filter applied"
        );
        filtered
    }

    /// True when a single record passes every predicate
    pub fn matches(record: &EngagementRecord, spec: &FilterSpec) -> bool {
        let date = record.date();
        spec.date_from <= date
            && date <= spec.date_to
            && spec.platforms.contains(&record.platform)
            && spec.regions.contains(&record.region)
            && spec.themes.contains(&record.content_theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Dimensions;
    use crate::metrics::MetricDeriver;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn make_records() -> Vec<MeasuredRecord> {
        let rows = [
            (1, 8, "TikTok", "France", "Sports"),
            (1, 22, "Instagram", "US", "Food"),
            (2, 9, "TikTok", "US", "Food"),
            (3, 23, "YouTube", "India", "Health"),
            (5, 0, "TikTok", "France", "Health"),
        ];
        MetricDeriver::derive(
            rows.iter()
                .map(|(day, hour, platform, region, theme)| {
                    let ts = date(*day).and_hms_opt(*hour, 30, 0).unwrap();
                    EngagementRecord::new(ts, *platform, *region, *theme)
                        .with_counts(1000, 100, 10, 5)
                })
                .collect(),
        )
    }

    fn select_all(records: &[MeasuredRecord]) -> FilterSpec {
        let dimensions = Dimensions::from_records(records.iter().map(MeasuredRecord::record));
        FilterSpec::all(&dimensions).unwrap()
    }

    #[test]
    fn test_default_selection_is_identity() {
        let records = make_records();
        let spec = select_all(&records);

        assert_eq!(FilterEngine::apply(&records, &spec), records);
    }

    #[test]
    fn test_date_bounds_are_inclusive_and_ignore_time() {
        let records = make_records();
        let mut spec = select_all(&records);
        spec.date_from = date(1);
        spec.date_to = date(3);

        let filtered = FilterEngine::apply(&records, &spec);
        // The 23:30 post on the 3rd is still inside the window
        assert_eq!(filtered.len(), 4);
        assert!(filtered.iter().all(|m| m.record().date() <= date(3)));
    }

    #[test]
    fn test_category_predicates_are_conjunctive() {
        let records = make_records();
        let spec = select_all(&records)
            .with_platforms(["TikTok"])
            .with_regions(["France", "US"])
            .with_themes(["Food", "Health"]);

        let filtered = FilterEngine::apply(&records, &spec);
        let dates: Vec<_> = filtered.iter().map(|m| m.record().date()).collect();
        assert_eq!(dates, vec![date(2), date(5)]);
    }

    #[test]
    fn test_empty_selection_selects_nothing() {
        let records = make_records();
        let spec = select_all(&records).with_regions(Vec::<String>::new());

        assert!(FilterEngine::apply(&records, &spec).is_empty());
    }

    #[test]
    fn test_inverted_range_is_empty_not_error() {
        let records = make_records();
        let mut spec = select_all(&records);
        spec.date_from = date(5);
        spec.date_to = date(1);

        assert!(spec.has_inverted_range());
        assert!(FilterEngine::apply(&records, &spec).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = make_records();
        let spec = select_all(&records).with_themes(["Food", "Sports"]);

        let once = FilterEngine::apply(&records, &spec);
        let twice = FilterEngine::apply(&once, &spec);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let records = make_records();
        let before = records.clone();
        let spec = select_all(&records).with_platforms(["YouTube"]);

        let filtered = FilterEngine::apply(&records, &spec);
        assert_eq!(filtered.len(), 1);
        assert_eq!(records, before);
    }
}
