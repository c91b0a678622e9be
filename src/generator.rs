//! Synthetic dataset generation
//!
//! Produces a realistic engagement table when no source file exists. Each
//! platform has its own view and interaction profile, themes and regions
//! scale reach, and weekend posts get a boost. Output is deterministic for a
//! given seed and anchor time.

use chrono::{Datelike, Duration, Local, NaiveDateTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::schema::EngagementRecord;

/// Default number of generated records
pub const DEFAULT_RECORD_COUNT: usize = 1000;

/// Default RNG seed
pub const DEFAULT_SEED: u64 = 42;

/// Default length of the generated window in days
pub const DEFAULT_WINDOW_DAYS: i64 = 180;

/// Platforms present in generated data
pub const PLATFORMS: [&str; 5] = ["Instagram", "TikTok", "Facebook", "YouTube", "Twitter"];

/// Regions present in generated data
pub const REGIONS: [&str; 7] = ["France", "US", "India", "UK", "Germany", "Brazil", "Japan"];

/// Content themes present in generated data
pub const THEMES: [&str; 10] = [
    "Environment",
    "Social Justice",
    "Politics",
    "Entertainment",
    "Technology",
    "Health",
    "Sports",
    "Fashion",
    "Food",
    "Travel",
];

/// Views floor before the weekend adjustment
const MIN_VIEWS: f64 = 100.0;

/// (mean, standard deviation) of a normal draw
type Spread = (f64, f64);

struct PlatformProfile {
    views: Spread,
    like_ratio: Spread,
    share_ratio: Spread,
    comment_ratio: Spread,
}

/// Seeded generator for synthetic engagement tables
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    records: usize,
    seed: u64,
    window_days: i64,
    anchor: NaiveDateTime,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticGenerator {
    /// Generator with default settings, anchored at the current local time
    pub fn new() -> Self {
        Self {
            records: DEFAULT_RECORD_COUNT,
            seed: DEFAULT_SEED,
            window_days: DEFAULT_WINDOW_DAYS,
            anchor: Local::now().naive_local(),
        }
    }

    pub fn with_records(mut self, records: usize) -> Self {
        self.records = records;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of days covered, ending at the anchor (at least one)
    pub fn with_window_days(mut self, window_days: i64) -> Self {
        self.window_days = window_days.max(1);
        self
    }

    /// End of the generated window
    pub fn with_anchor(mut self, anchor: NaiveDateTime) -> Self {
        self.anchor = anchor;
        self
    }

    /// Generate records sorted by timestamp
    pub fn generate(&self) -> Vec<EngagementRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let start = self.anchor.date() - Duration::days(self.window_days);

        let mut records: Vec<EngagementRecord> = (0..self.records)
            .map(|_| {
                let day = start + Duration::days(rng.random_range(0..self.window_days));
                let platform = PLATFORMS[rng.random_range(0..PLATFORMS.len())];
                let region = REGIONS[rng.random_range(0..REGIONS.len())];
                let theme = THEMES[rng.random_range(0..THEMES.len())];

                let profile = platform_profile(platform);
                let base_views = draw(&mut rng, profile.views);
                let like_ratio = draw(&mut rng, profile.like_ratio);
                let share_ratio = draw(&mut rng, profile.share_ratio);
                let comment_ratio = draw(&mut rng, profile.comment_ratio);
                let theme_factor = draw(&mut rng, theme_multiplier(theme));
                let region_factor = draw(&mut rng, region_multiplier(region));

                let mut views = (base_views * theme_factor * region_factor).trunc().max(MIN_VIEWS);
                let mut likes = (views * like_ratio).trunc().max(0.0);
                let mut shares = (views * share_ratio).trunc().max(0.0);
                let mut comments = (views * comment_ratio).trunc().max(0.0);

                if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                    views = boost(&mut rng, views);
                    likes = boost(&mut rng, likes);
                    shares = boost(&mut rng, shares);
                    comments = boost(&mut rng, comments);
                }

                let hour = rng.random_range(8..23);
                let minute = rng.random_range(0..60);
                let timestamp = day
                    .and_hms_opt(hour, minute, 0)
                    .unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN));

                EngagementRecord::new(timestamp, platform, region, theme).with_counts(
                    views as u64,
                    likes as u64,
                    shares as u64,
                    comments as u64,
                )
            })
            .collect();

        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        records
    }
}

fn platform_profile(platform: &str) -> PlatformProfile {
    match platform {
        "TikTok" => PlatformProfile {
            views: (50_000.0, 15_000.0),
            like_ratio: (0.15, 0.05),
            share_ratio: (0.04, 0.02),
            comment_ratio: (0.02, 0.01),
        },
        "Instagram" => PlatformProfile {
            views: (30_000.0, 10_000.0),
            like_ratio: (0.12, 0.04),
            share_ratio: (0.02, 0.01),
            comment_ratio: (0.03, 0.01),
        },
        "YouTube" => PlatformProfile {
            views: (25_000.0, 8_000.0),
            like_ratio: (0.08, 0.03),
            share_ratio: (0.01, 0.005),
            comment_ratio: (0.04, 0.02),
        },
        "Twitter" => PlatformProfile {
            views: (15_000.0, 5_000.0),
            like_ratio: (0.07, 0.03),
            share_ratio: (0.05, 0.02),
            comment_ratio: (0.01, 0.005),
        },
        _ => PlatformProfile {
            views: (40_000.0, 12_000.0),
            like_ratio: (0.1, 0.04),
            share_ratio: (0.03, 0.01),
            comment_ratio: (0.02, 0.01),
        },
    }
}

fn theme_multiplier(theme: &str) -> Spread {
    match theme {
        "Environment" => (1.2, 0.1),
        "Social Justice" => (1.3, 0.1),
        "Politics" => (1.1, 0.2),
        "Entertainment" => (1.4, 0.1),
        "Technology" => (0.9, 0.1),
        "Sports" => (1.1, 0.1),
        "Fashion" => (0.8, 0.1),
        "Food" => (0.9, 0.1),
        _ => (1.0, 0.1),
    }
}

fn region_multiplier(region: &str) -> Spread {
    match region {
        "France" | "Brazil" => (1.1, 0.1),
        "US" => (1.2, 0.1),
        "India" => (1.3, 0.1),
        "Germany" => (0.9, 0.1),
        "Japan" => (0.8, 0.1),
        _ => (1.0, 0.1),
    }
}

/// Weekend engagement boost around +20%
fn boost(rng: &mut StdRng, value: f64) -> f64 {
    (value * draw(rng, (1.2, 0.1))).trunc().max(0.0)
}

/// Normal draw. An invalid spread falls back to the mean.
fn draw(rng: &mut StdRng, (mean, std_dev): Spread) -> f64 {
    Normal::new(mean, std_dev).map_or(mean, |normal| normal.sample(rng))
}
