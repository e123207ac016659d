//! Unit tests for the retention policy.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn days_ago(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Some(now - Duration::days(days))
}

#[rstest]
fn prefix_selects_only_matching_names(now: DateTime<Utc>) {
    let policy = RetentionPolicy::new(Some(String::from("test-")), DEFAULT_MAX_AGE_DAYS);
    let selected = ["test-ws1", "prod-ws2", "test-ws3"]
        .into_iter()
        .filter(|name| policy.evaluate(name, None, now).is_delete())
        .collect::<Vec<_>>();
    assert_eq!(selected, vec!["test-ws1", "test-ws3"]);
}

#[rstest]
fn prefix_ignores_age(now: DateTime<Utc>) {
    let policy = RetentionPolicy::new(Some(String::from("test-")), DEFAULT_MAX_AGE_DAYS);
    assert_eq!(
        policy.evaluate("prod-old", days_ago(now, 365), now),
        Decision::Keep
    );
    assert_eq!(
        policy.evaluate("test-new", Some(now), now),
        Decision::Delete(Reason::PrefixMatch)
    );
}

#[rstest]
fn ages_without_prefix_select_only_expired(now: DateTime<Utc>) {
    let policy = RetentionPolicy::default();
    let ages = [("three", 3), ("ten", 10), ("seven", 7)];
    let selected = ages
        .into_iter()
        .filter(|(name, age)| policy.evaluate(name, days_ago(now, *age), now).is_delete())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    assert_eq!(selected, vec!["ten"]);
}

#[rstest]
#[case::exactly_seven_days(Duration::days(7), Decision::Keep)]
#[case::one_second_past(
    Duration::days(7) + Duration::seconds(1),
    Decision::Delete(Reason::Expired)
)]
#[case::one_second_short(Duration::days(7) - Duration::seconds(1), Decision::Keep)]
fn age_boundary_is_strict(now: DateTime<Utc>, #[case] age: Duration, #[case] expected: Decision) {
    let policy = RetentionPolicy::default();
    assert_eq!(policy.evaluate("anything", Some(now - age), now), expected);
}

#[rstest]
fn empty_prefix_falls_back_to_age(now: DateTime<Utc>) {
    let policy = RetentionPolicy::new(Some(String::new()), DEFAULT_MAX_AGE_DAYS);
    assert_eq!(policy.prefix(), None);
    assert_eq!(
        policy.evaluate("fresh", Some(now), now),
        Decision::Keep,
        "an empty prefix must not match every name"
    );
}

#[rstest]
fn missing_creation_time_is_kept(now: DateTime<Utc>) {
    assert_eq!(RetentionPolicy::default().evaluate("x", None, now), Decision::Keep);
}

#[rstest]
fn custom_threshold_is_honoured(now: DateTime<Utc>) {
    let policy = RetentionPolicy::new(None, 14);
    assert_eq!(policy.evaluate("x", days_ago(now, 10), now), Decision::Keep);
    assert!(policy.evaluate("x", days_ago(now, 15), now).is_delete());
}

#[rstest]
#[case("__databricks_internal")]
#[case("system")]
#[case("my_system_copy")]
#[case("hive_metastore")]
fn system_catalogs_are_protected(now: DateTime<Utc>, #[case] name: &str) {
    let policy = RetentionPolicy::new(Some(String::new()), 0);
    let decision = evaluate_with(
        &Selector::PrefixOrAge,
        &Protection::SystemCatalogs,
        &policy,
        name,
        days_ago(now, 400),
        now,
    );
    assert_eq!(decision, Decision::Keep);
}

#[rstest]
fn protection_wins_over_prefix(now: DateTime<Utc>) {
    let policy = RetentionPolicy::new(Some(String::from("__")), DEFAULT_MAX_AGE_DAYS);
    let decision = evaluate_with(
        &Selector::PrefixOrAge,
        &Protection::SystemCatalogs,
        &policy,
        "__hidden",
        None,
        now,
    );
    assert_eq!(decision, Decision::Keep);
}

#[rstest]
#[case("alice@awsbricks.com", Decision::Delete(Reason::DomainMember))]
#[case("labuser+1@awsbricks.com", Decision::Keep)]
#[case("bob@example.com", Decision::Keep)]
fn domain_selector_spares_protected_user(
    now: DateTime<Utc>,
    #[case] name: &str,
    #[case] expected: Decision,
) {
    let decision = evaluate_with(
        &Selector::AccountDomain(String::from("@awsbricks.com")),
        &Protection::Named(String::from("labuser+1@awsbricks.com")),
        &RetentionPolicy::new(Some(String::from("zzz")), DEFAULT_MAX_AGE_DAYS),
        name,
        None,
        now,
    );
    assert_eq!(decision, expected);
}
