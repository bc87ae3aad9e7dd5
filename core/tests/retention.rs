use chrono::{Duration, TimeZone};
use chrono_tz::Europe::Kyiv;
use rust_decimal_macros::dec;
use shiftrank_core::{
    config::AppConfig,
    delivery::LogPublisher,
    scheduler::{JobKind, JobSpec, Scheduler},
    store::LedgerStore,
    types::Site,
};

fn sweep_job() -> JobSpec {
    JobSpec {
        name: "retention_sweep".to_string(),
        hour: 12,
        minute: 0,
        second: 10,
        day_of_week: None,
        kind: JobKind::RetentionSweep,
    }
}

#[test]
fn sweep_deletes_strictly_older_than_cutoff() {
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    let config = AppConfig::default_test();
    let id = store
        .replace_operator(1, "phoenix", "Tanos", "Deadpool", Site::Lf, "day")
        .unwrap();

    let fired_at = Kyiv.with_ymd_and_hms(2025, 3, 10, 12, 0, 10).unwrap();
    let cutoff = (fired_at - Duration::days(config.retention_days)).timestamp();

    store
        .insert_entry(id, dec!(1), "old", cutoff - 1)
        .unwrap();
    store
        .insert_entry(id, dec!(2), "at-cutoff", cutoff)
        .unwrap();
    store
        .insert_entry(id, dec!(3), "fresh", cutoff + 86_400)
        .unwrap();

    let scheduler = Scheduler::new(&store, &config, &LogPublisher);
    scheduler.run_job(&sweep_job(), fired_at).unwrap();

    let survivors = store.entries_for_operator(id).unwrap();
    let drafts: Vec<&str> = survivors.iter().map(|e| e.draft.as_str()).collect();
    assert_eq!(
        drafts,
        vec!["at-cutoff", "fresh"],
        "only entries strictly older than the cutoff are swept"
    );
}

#[test]
fn sweep_is_idempotent() {
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    let config = AppConfig::default_test();
    let id = store
        .replace_operator(1, "phoenix", "Tanos", "Deadpool", Site::Lf, "day")
        .unwrap();

    let fired_at = Kyiv.with_ymd_and_hms(2025, 3, 10, 12, 0, 10).unwrap();
    store
        .insert_entry(id, dec!(1), "ancient", 1_000_000)
        .unwrap();
    store
        .insert_entry(id, dec!(2), "fresh", fired_at.timestamp() - 60)
        .unwrap();

    let scheduler = Scheduler::new(&store, &config, &LogPublisher);
    scheduler.run_job(&sweep_job(), fired_at).unwrap();
    assert_eq!(store.entry_count().unwrap(), 1);

    scheduler.run_job(&sweep_job(), fired_at).unwrap();
    assert_eq!(store.entry_count().unwrap(), 1, "second sweep removes nothing");
}

#[test]
fn sweep_survives_a_dst_fold_at_the_horizon() {
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    let config = AppConfig::default_test();
    let id = store
        .replace_operator(1, "phoenix", "Tanos", "Deadpool", Site::Lf, "day")
        .unwrap();

    // Nine days before this fire time is 03:30 on 2025-10-26, inside the
    // hour Kyiv repeats when clocks fall back. A calendar-day subtraction
    // has no unique answer there; the sweep must still use the absolute
    // nine-day horizon and leave recent entries alone.
    let fired_at = Kyiv.with_ymd_and_hms(2025, 11, 4, 3, 30, 0).unwrap();
    store
        .insert_entry(id, dec!(1), "ancient", fired_at.timestamp() - 30 * 86_400)
        .unwrap();
    store
        .insert_entry(id, dec!(2), "fresh", fired_at.timestamp() - 2 * 86_400)
        .unwrap();

    let scheduler = Scheduler::new(&store, &config, &LogPublisher);
    scheduler.run_job(&sweep_job(), fired_at).unwrap();

    let survivors = store.entries_for_operator(id).unwrap();
    assert_eq!(survivors.len(), 1, "two-day-old entry must survive");
    assert_eq!(survivors[0].draft, "fresh");
}
