// Criterion benchmarks for Smart Match

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use smart_match::core::{
    distance::haversine_distance,
    scoring::{score_candidate, ScoringContext},
    MatchQuery, Matcher, RequesterProfile,
};
use smart_match::models::{
    CandidateTask, CategoryAffinity, CompletedBooking, Coordinates, EffectivePreferences, MatchPreferences,
    PreferenceDefaults,
};

const CATEGORIES: [&str; 5] = ["cleaning", "moving", "gardening", "assembly", "delivery"];
const PRIORITIES: [&str; 3] = ["urgent", "high", "medium"];

fn create_task(id: usize, lat: f64, lon: f64) -> CandidateTask {
    let now = Utc::now();
    CandidateTask {
        id: id.to_string(),
        title: format!("Task {}", id),
        category: CATEGORIES[id % CATEGORIES.len()].to_string(),
        pay_amount: 20.0 + (id % 40) as f64 * 10.0,
        location: "Downtown".to_string(),
        latitude: (id % 7 != 0).then_some(lat),
        longitude: (id % 7 != 0).then_some(lon),
        priority: Some(PRIORITIES[id % PRIORITIES.len()].to_string()),
        created_at: now - Duration::minutes((id * 17 % 2000) as i64),
        deadline: (id % 4 == 0).then(|| now + Duration::hours((id % 96) as i64)),
        status: "open".to_string(),
        user_id: format!("poster-{}", id % 13),
    }
}

fn create_profile() -> RequesterProfile {
    let history: Vec<CompletedBooking> = (0..50)
        .map(|i| CompletedBooking {
            task_id: format!("done-{}", i),
            category: Some(CATEGORIES[i % 3].to_string()),
        })
        .collect();

    RequesterProfile {
        preferences: Some(MatchPreferences {
            user_id: "worker".to_string(),
            preferred_categories: Some(vec!["cleaning".to_string(), "moving".to_string()]),
            preferred_radius_km: Some(30.0),
            price_range_min: Some(40.0),
            price_range_max: Some(250.0),
        }),
        profile: None,
        affinity: CategoryAffinity::from_history(&history),
    }
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(40.7128),
                black_box(-74.0060),
                black_box(40.72),
                black_box(-74.01),
            )
        });
    });
}

fn bench_score_candidate(c: &mut Criterion) {
    let profile = create_profile();
    let preferences = EffectivePreferences::resolve(profile.preferences.as_ref(), &PreferenceDefaults::default());
    let task = create_task(8, 40.72, -74.01);
    let now = Utc::now();

    c.bench_function("score_candidate", |b| {
        b.iter(|| {
            score_candidate(black_box(&ScoringContext {
                task: &task,
                preferences: &preferences,
                affinity: &profile.affinity,
                category_filter: None,
                distance_km: Some(1.4),
                now,
            }))
        });
    });
}

fn bench_matching(c: &mut Criterion) {
    let matcher = Matcher::default();
    let profile = create_profile();

    let mut group = c.benchmark_group("matching");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<CandidateTask> = (0..*candidate_count)
            .map(|i| {
                let lat_offset = (i as f64 * 0.003) % 0.5;
                let lon_offset = (i as f64 * 0.002) % 0.5;
                create_task(i, 40.7128 + lat_offset, -74.0060 + lon_offset)
            })
            .collect();

        let query = MatchQuery {
            requester_id: "worker",
            location: Some(Coordinates::new(40.7128, -74.0060)),
            category_filter: None,
            limit: 20,
            now: Utc::now(),
        };

        group.bench_with_input(
            BenchmarkId::new("find_matches", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    matcher.find_matches(
                        black_box(&profile),
                        black_box(candidates.clone()),
                        black_box(&query),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_score_candidate,
    bench_matching
);

criterion_main!(benches);
