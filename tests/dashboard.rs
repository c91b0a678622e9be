use std::sync::Arc;

use brut_engagement::generator::SyntheticGenerator;
use brut_engagement::schema::RecordAdapter;
use brut_engagement::source::SourceId;
use brut_engagement::types::EmptyReason;
use brut_engagement::{
    Aggregator, DashboardEngine, DashboardView, DataOrigin, Dataset, FilterEngine, FilterSpec,
    Kpis, MetricDeriver, ViewOptions,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

const TABLE: &str = "\
timestamp,platform,region,content_theme,views,likes,shares,comments
2024-05-01 10:00:00,A,France,News,100,10,5,5
2024-05-01 12:00:00,A,US,Sports,200,20,0,0
2024-05-02 09:00:00,B,France,News,0,0,0,0
";

fn engine_from(csv_text: &str) -> DashboardEngine {
    let table = RecordAdapter::parse_str(csv_text).unwrap();
    let source = SourceId {
        path: "inline.csv".into(),
        modified: None,
        len: csv_text.len() as u64,
    };
    let dataset = Dataset::from_records(source, DataOrigin::File, table.records, table.report);
    DashboardEngine::new(Arc::new(dataset))
}

fn generated_engine(seed: u64) -> DashboardEngine {
    let anchor = NaiveDate::from_ymd_opt(2024, 8, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let records = SyntheticGenerator::new()
        .with_records(300)
        .with_seed(seed)
        .with_window_days(60)
        .with_anchor(anchor)
        .generate();
    let source = SourceId {
        path: "generated.csv".into(),
        modified: None,
        len: 0,
    };
    let report = brut_engagement::LoadReport::clean(records.len());
    let dataset = Dataset::from_records(source, DataOrigin::Generated, records, report);
    DashboardEngine::new(Arc::new(dataset))
}

#[test]
fn test_two_platform_scenario_with_zero_view_post() {
    let engine = engine_from(TABLE);
    let view = engine.render(&engine.default_filter().unwrap());
    let dashboard = view.dashboard().unwrap();

    assert_eq!(dashboard.platforms.len(), 2);
    assert_eq!(dashboard.platforms[0].platform, "A");
    assert_eq!(dashboard.platforms[0].views, 300);
    assert_eq!(dashboard.platforms[0].engagement_rate, 15.0);
    assert_eq!(dashboard.platforms[1].platform, "B");
    assert_eq!(dashboard.platforms[1].engagement_rate, 0.0);

    assert_eq!(dashboard.kpis.total_views, 300);
    assert_eq!(dashboard.kpis.avg_likes, 10);
    assert!(dashboard.kpis.avg_engagement.is_finite());
}

#[test]
fn test_empty_input_has_empty_kpis_and_tables() {
    assert_eq!(Aggregator::kpis(&[]), Kpis::Empty);
    assert!(Aggregator::by_platform(&[]).is_empty());
    assert!(Aggregator::top_themes(&[], 5).is_empty());
    assert!(Aggregator::daily_series(&[]).is_empty());

    let engine = engine_from("timestamp,platform,region,content_theme,views,likes,shares,comments\n");
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    assert!(engine.render(&FilterSpec::new(day, day)).is_empty());
}

#[test]
fn test_inverted_date_range_is_empty_not_error() {
    let engine = engine_from(TABLE);
    let mut filter = engine.default_filter().unwrap();
    std::mem::swap(&mut filter.date_from, &mut filter.date_to);

    assert!(FilterEngine::apply(engine.dataset().records(), &filter).is_empty());
    match engine.render(&filter) {
        DashboardView::Empty { reason, .. } => assert_eq!(reason, EmptyReason::InvertedDateRange),
        DashboardView::Ready(_) => panic!("expected an empty view"),
    }
}

#[test]
fn test_rates_above_one_hundred_are_kept() {
    let engine = engine_from(
        "\
timestamp,platform,region,content_theme,views,likes,shares,comments
2024-05-01 10:00:00,A,France,News,10,20,3,2
",
    );
    let view = engine.render(&engine.default_filter().unwrap());
    assert_eq!(view.dashboard().unwrap().recent_posts[0].engagement_rate, 250.0);
}

#[test]
fn test_default_selection_is_identity_and_filter_is_idempotent() {
    let engine = generated_engine(11);
    let records = engine.dataset().records();
    let all = engine.default_filter().unwrap();

    assert_eq!(FilterEngine::apply(records, &all), records.to_vec());

    let narrowed = all.clone().with_platforms(["TikTok", "YouTube"]).with_regions(["France"]);
    let once = FilterEngine::apply(records, &narrowed);
    assert_eq!(FilterEngine::apply(&once, &narrowed), once);
}

#[test]
fn test_rollups_partition_the_selection() {
    let engine = generated_engine(23);
    let records = engine.dataset().records();
    let total: u64 = records.iter().map(|m| m.record().views).sum();

    let by_platform: u64 = Aggregator::by_platform(records).iter().map(|r| r.views).sum();
    let by_day: u64 = Aggregator::daily_series(records).iter().map(|r| r.views).sum();

    assert_eq!(by_platform, total);
    assert_eq!(by_day, total);
}

#[test]
fn test_top_themes_bound_and_order() {
    let engine = generated_engine(5);
    let records = engine.dataset().records();
    let distinct = engine.dataset().dimensions().themes.len();

    for n in [0, 1, 3, distinct + 2] {
        let top = Aggregator::top_themes(records, n);
        assert_eq!(top.len(), n.min(distinct));
        assert!(top
            .windows(2)
            .all(|pair| pair[0].engagement_rate >= pair[1].engagement_rate));
    }
}

#[test]
fn test_view_options_limit_tables() {
    let base = generated_engine(3);
    let engine = DashboardEngine::with_options(
        Arc::new(Dataset::from_records(
            base.dataset().source().clone(),
            base.dataset().origin(),
            base.dataset()
                .records()
                .iter()
                .map(|m| m.record().clone())
                .collect(),
            base.dataset().report().clone(),
        )),
        ViewOptions {
            top_themes: 3,
            display_rows: 4,
        },
    );

    let view = engine.render(&engine.default_filter().unwrap());
    let dashboard = view.dashboard().unwrap();
    assert_eq!(dashboard.top_themes.len(), 3);
    assert_eq!(dashboard.recent_posts.len(), 4);
    assert!(dashboard
        .recent_posts
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
}

#[test]
fn test_measured_rates_match_metric_function() {
    let table = RecordAdapter::parse_str(TABLE).unwrap();
    let measured = MetricDeriver::derive(table.records);

    for m in &measured {
        let r = m.record();
        assert_eq!(
            m.engagement_rate(),
            brut_engagement::engagement_rate(r.likes, r.comments, r.shares, r.views)
        );
    }
}

#[test]
fn test_accepted_row_with_maximal_count_renders() {
    let engine = engine_from(
        "\
timestamp,platform,region,content_theme,views,likes,shares,comments
2024-05-01 10:00:00,A,France,News,1000,18446744073709551615,1,0
2024-05-01 11:00:00,A,France,News,18446744073709551615,5,0,0
",
    );
    assert_eq!(engine.dataset().report().accepted_rows, 2);

    let view = engine.render(&engine.default_filter().unwrap());
    let dashboard = view.dashboard().unwrap();

    assert_eq!(dashboard.kpis.total_views, u64::MAX);
    assert!(dashboard.kpis.avg_engagement.is_finite());
    assert_eq!(dashboard.platforms[0].likes, u64::MAX);
    assert!(dashboard.daily[0].engagement_rate.is_finite());
}
