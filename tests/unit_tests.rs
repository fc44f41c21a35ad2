// Unit tests for the Smart Match scoring engine

use chrono::{DateTime, Duration, Utc};
use smart_match::core::{
    distance::{distance_between, haversine_distance},
    matcher::compare_ranked,
    scoring::{applied_rules, score_candidate, ScoringContext, MAX_SCORE, MIN_SCORE},
    MatchQuery, Matcher, RequesterProfile,
};
use smart_match::models::{
    CandidateTask, CategoryAffinity, Coordinates, EffectivePreferences, MatchPreferences, PreferenceDefaults,
    PriceRange,
};

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-05-10T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn create_task(id: &str, category: &str, pay_amount: f64) -> CandidateTask {
    CandidateTask {
        id: id.to_string(),
        title: format!("Task {}", id),
        category: category.to_string(),
        pay_amount,
        location: "Downtown".to_string(),
        latitude: None,
        longitude: None,
        priority: Some("medium".to_string()),
        created_at: now() - Duration::days(3),
        deadline: None,
        status: "open".to_string(),
        user_id: "owner".to_string(),
    }
}

fn preferences(categories: &[&str], radius_km: f64, price: PriceRange) -> EffectivePreferences {
    EffectivePreferences {
        categories: categories.iter().map(|c| c.to_string()).collect(),
        max_distance_km: radius_km,
        price_range: price,
    }
}

fn default_price() -> PriceRange {
    PriceRange { min: 0.0, max: 1000.0 }
}

fn context<'a>(
    task: &'a CandidateTask,
    preferences: &'a EffectivePreferences,
    affinity: &'a CategoryAffinity,
    distance_km: Option<f64>,
) -> ScoringContext<'a> {
    ScoringContext {
        task,
        preferences,
        affinity,
        category_filter: None,
        distance_km,
        now: now(),
    }
}

/// Latitude offset that puts a point `km` north of the origin
fn north_of(km: f64) -> f64 {
    km / 111.195
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(40.7128, -74.0060, 40.7128, -74.0060);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_manhattan_to_brooklyn() {
    let distance = haversine_distance(40.7580, -73.9855, 40.6782, -73.9442);
    assert!(distance > 5.0 && distance < 15.0);
}

#[test]
fn test_distance_between_missing_coordinates() {
    let here = Some(Coordinates::new(40.0, -74.0));
    assert!(distance_between(here, None).is_none());
    assert!(distance_between(None, here).is_none());
    assert!(distance_between(here, here).unwrap() < 0.001);
}

#[test]
fn test_scenario_preferred_nearby_fresh_task_is_clamped() {
    let mut task = create_task("a", "cleaning", 50.0);
    task.created_at = now() - Duration::minutes(30);
    let prefs = preferences(&["cleaning"], 25.0, default_price());
    let affinity = CategoryAffinity::default();

    let card = score_candidate(&context(&task, &prefs, &affinity, Some(3.0)));

    // 50 + 20 + 20 + 10 + 10 = 110
    assert_eq!(card.score, 100);
    assert_eq!(
        card.reasons,
        vec!["Matches your preferred category", "Very close to you", "Matches your price range"]
    );
}

#[test]
fn test_scenario_urgent_high_value_without_location() {
    // Price range excludes 500 so the price bonus stays out of the total
    let mut task = create_task("b", "moving", 500.0);
    task.priority = Some("urgent".to_string());
    task.deadline = Some(now() + Duration::days(1));
    let prefs = preferences(&["cleaning"], 25.0, PriceRange { min: 0.0, max: 200.0 });
    let affinity = CategoryAffinity::default();

    let card = score_candidate(&context(&task, &prefs, &affinity, None));

    assert_eq!(card.score, 70);
    assert!(card.distance_km.is_none());
    assert_eq!(card.reasons, vec!["High-value task", "Urgent - pays faster", "Deadline soon"]);
}

#[test]
fn test_scenario_urgent_high_value_with_default_price_range() {
    let mut task = create_task("b", "moving", 500.0);
    task.priority = Some("urgent".to_string());
    task.deadline = Some(now() + Duration::days(1));
    let prefs = preferences(&["cleaning"], 25.0, default_price());
    let affinity = CategoryAffinity::default();

    let card = score_candidate(&context(&task, &prefs, &affinity, None));

    assert_eq!(card.score, 80);
}

#[test]
fn test_scenario_beyond_radius_is_a_penalty() {
    let task = create_task("c", "gardening", 20.0);
    let prefs = preferences(&[], 25.0, PriceRange { min: 100.0, max: 200.0 });
    let affinity = CategoryAffinity::default();

    let card = score_candidate(&context(&task, &prefs, &affinity, Some(40.0)));

    assert_eq!(card.score, 40);
    assert!(card.reasons.is_empty());
}

#[test]
fn test_scenario_history_bonus_is_capped() {
    let task = create_task("d", "assembly", 2000.0);
    let prefs = preferences(&[], 25.0, default_price());
    let affinity: CategoryAffinity = [("assembly".to_string(), 3)].into_iter().collect();

    let rules = applied_rules(&context(&task, &prefs, &affinity, None));
    let history = rules.iter().find(|r| r.name == "personal_history").unwrap();

    assert_eq!(history.adjustment, 5);
}

#[test]
fn test_distance_rules_fire_at_most_once() {
    let task = create_task("e", "cleaning", 10.0);
    let prefs = preferences(&[], 25.0, default_price());
    let affinity = CategoryAffinity::default();
    let distance_rules = ["very_close", "nearby", "within_radius", "beyond_radius"];

    for distance in [0.0, 5.0, 5.1, 10.0, 10.1, 25.0, 25.1, 500.0] {
        let fired = applied_rules(&context(&task, &prefs, &affinity, Some(distance)))
            .into_iter()
            .filter(|r| distance_rules.contains(&r.name))
            .count();
        assert_eq!(fired, 1, "distance {} fired {} distance rules", distance, fired);
    }

    let fired = applied_rules(&context(&task, &prefs, &affinity, None))
        .into_iter()
        .filter(|r| distance_rules.contains(&r.name))
        .count();
    assert_eq!(fired, 0);
}

#[test]
fn test_small_radius_penalizes_nearby_band_edge() {
    // 11 km is past the nearby band and past a 8 km radius
    let task = create_task("f", "cleaning", 10.0);
    let prefs = preferences(&[], 8.0, default_price());
    let affinity = CategoryAffinity::default();

    let names: Vec<_> = applied_rules(&context(&task, &prefs, &affinity, Some(11.0)))
        .into_iter()
        .map(|r| r.name)
        .collect();

    assert!(names.contains(&"beyond_radius"));
}

#[test]
fn test_score_always_within_bounds() {
    let affinity: CategoryAffinity = [("cleaning".to_string(), 40)].into_iter().collect();
    let prefs = preferences(&["cleaning"], 25.0, default_price());

    for (pay, priority, distance, age_minutes) in [
        (0.0, None, Some(900.0), 60 * 24 * 30),
        (5000.0, Some("urgent"), Some(0.5), 5),
        (150.0, Some("high"), None, 120),
    ] {
        let mut task = create_task("g", "cleaning", pay);
        task.priority = priority.map(str::to_string);
        task.created_at = now() - Duration::minutes(age_minutes);
        task.deadline = Some(now() + Duration::hours(12));

        let card = score_candidate(&context(&task, &prefs, &affinity, distance));
        assert!(card.score >= MIN_SCORE && card.score <= MAX_SCORE);
        assert!(card.reasons.len() <= 3);
    }
}

#[test]
fn test_recency_bands() {
    let prefs = preferences(&[], 25.0, PriceRange { min: 0.0, max: 0.0 });
    let affinity = CategoryAffinity::default();
    let score_at = |age: Duration| {
        let mut task = create_task("h", "cleaning", 10.0);
        task.created_at = now() - age;
        score_candidate(&context(&task, &prefs, &affinity, None)).score
    };

    assert_eq!(score_at(Duration::minutes(59)), 60);
    assert_eq!(score_at(Duration::minutes(60)), 55);
    assert_eq!(score_at(Duration::minutes(359)), 55);
    assert_eq!(score_at(Duration::hours(6)), 50);
}

#[test]
fn test_past_deadline_earns_nothing() {
    let mut task = create_task("i", "cleaning", 10.0);
    task.deadline = Some(now() - Duration::hours(1));
    let prefs = preferences(&[], 25.0, PriceRange { min: 0.0, max: 0.0 });
    let affinity = CategoryAffinity::default();

    assert_eq!(score_candidate(&context(&task, &prefs, &affinity, None)).score, 50);
}

#[test]
fn test_matcher_end_to_end() {
    let matcher = Matcher::default();
    let origin = Coordinates::new(40.0, -74.0);
    let profile = RequesterProfile {
        preferences: Some(MatchPreferences {
            user_id: "worker".to_string(),
            preferred_categories: Some(vec!["cleaning".to_string()]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut close = create_task("close", "cleaning", 80.0);
    close.latitude = Some(40.0 + north_of(2.0));
    close.longitude = Some(-74.0);

    let mut far = create_task("far", "cleaning", 80.0);
    far.latitude = Some(40.0 + north_of(60.0));
    far.longitude = Some(-74.0);

    let mut own = create_task("own", "cleaning", 80.0);
    own.user_id = "worker".to_string();

    let mut assigned = create_task("assigned", "cleaning", 80.0);
    assigned.status = "assigned".to_string();

    let outcome = matcher.find_matches(
        &profile,
        vec![far, own, close, assigned],
        &MatchQuery {
            requester_id: "worker",
            location: Some(origin),
            category_filter: None,
            limit: 20,
            now: now(),
        },
    );

    let ids: Vec<_> = outcome.matches.iter().map(|m| m.task_id.as_str()).collect();
    assert_eq!(ids, vec!["close", "far"]);
    assert_eq!(outcome.total_available, 2);
    assert_eq!(outcome.matches[0].distance_km, Some(2.0));
    assert_eq!(outcome.preferences.max_distance_km, PreferenceDefaults::default().radius_km);
}

#[test]
fn test_ranking_is_score_then_newest_then_id() {
    let matcher = Matcher::default();
    let mut older = create_task("b-older", "cleaning", 10.0);
    older.created_at = now() - Duration::days(5);
    let newer = create_task("c-newer", "cleaning", 10.0);
    let twin = create_task("a-twin", "cleaning", 10.0);

    let outcome = matcher.find_matches(
        &RequesterProfile::default(),
        vec![older, newer, twin],
        &MatchQuery {
            requester_id: "worker",
            location: None,
            category_filter: None,
            limit: 10,
            now: now(),
        },
    );

    let ids: Vec<_> = outcome.matches.iter().map(|m| m.task_id.as_str()).collect();
    assert_eq!(ids, vec!["a-twin", "c-newer", "b-older"]);
    assert!(outcome
        .matches
        .windows(2)
        .all(|pair| compare_ranked(&pair[0], &pair[1]).is_le()));
}

#[test]
fn test_matching_is_repeatable_and_order_independent() {
    let matcher = Matcher::default();
    let profile = RequesterProfile {
        preferences: Some(MatchPreferences {
            user_id: "worker".to_string(),
            preferred_categories: Some(vec!["moving".to_string()]),
            preferred_radius_km: Some(12.0),
            ..Default::default()
        }),
        affinity: [("cleaning".to_string(), 2)].into_iter().collect(),
        ..Default::default()
    };

    let candidates: Vec<CandidateTask> = (0..12)
        .map(|i| {
            let mut task = create_task(&format!("t{:02}", i), ["cleaning", "moving", "delivery"][i % 3], 30.0 * i as f64);
            task.latitude = Some(40.0 + north_of(i as f64 * 2.5));
            task.longitude = Some(-74.0);
            task.priority = ["urgent", "high", "medium", "low"][i % 4].to_string().into();
            task.created_at = now() - Duration::minutes(40 * (i as i64 % 5));
            task
        })
        .collect();

    let query = MatchQuery {
        requester_id: "worker",
        location: Some(Coordinates::new(40.0, -74.0)),
        category_filter: None,
        limit: 8,
        now: now(),
    };

    let first = matcher.find_matches(&profile, candidates.clone(), &query);
    let second = matcher.find_matches(&profile, candidates.clone(), &query);
    assert_eq!(first.matches, second.matches);

    let mut reversed = candidates.clone();
    reversed.reverse();
    let mut rotated = candidates;
    rotated.rotate_left(5);

    for shuffled in [reversed, rotated] {
        let outcome = matcher.find_matches(&profile, shuffled, &query);
        assert_eq!(outcome.matches, first.matches);
        assert_eq!(outcome.total_available, first.total_available);
    }
}
