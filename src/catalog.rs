//! Dimension catalog
//!
//! Distinct category values and the date span of a loaded collection. The
//! dashboard shell builds its selection widgets and default filter from this.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schema::EngagementRecord;

/// Distinct values per category, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub platforms: Vec<String>,
    pub regions: Vec<String>,
    pub themes: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl Dimensions {
    /// Build the catalog from a collection of records
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EngagementRecord>,
    {
        let mut dimensions = Dimensions::default();
        let mut platforms = HashSet::new();
        let mut regions = HashSet::new();
        let mut themes = HashSet::new();

        for record in records {
            push_distinct(&mut platforms, &mut dimensions.platforms, &record.platform);
            push_distinct(&mut regions, &mut dimensions.regions, &record.region);
            push_distinct(&mut themes, &mut dimensions.themes, &record.content_theme);

            let date = record.date();
            dimensions.first_date = Some(dimensions.first_date.map_or(date, |d| d.min(date)));
            dimensions.last_date = Some(dimensions.last_date.map_or(date, |d| d.max(date)));
        }

        dimensions
    }

    /// `(first, last)` date, or `None` for an empty collection
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.first_date.zip(self.last_date)
    }

    pub fn is_empty(&self) -> bool {
        self.first_date.is_none()
    }
}

fn push_distinct<'a>(seen: &mut HashSet<&'a str>, values: &mut Vec<String>, value: &'a str) {
    if seen.insert(value) {
        values.push(value.to_string());
    }
}
