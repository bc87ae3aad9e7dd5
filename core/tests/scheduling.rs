use chrono::TimeZone;
use chrono_tz::Europe::Kyiv;
use shiftrank_core::{
    aggregate::Level,
    config::AppConfig,
    delivery::LogPublisher,
    report::ReportSpec,
    scheduler::{JobKind, JobSpec, Scheduler},
    store::LedgerStore,
    window::ReportKind,
};

fn report_job(name: &str, hour: u32, minute: u32, second: u32, level: Level) -> JobSpec {
    JobSpec {
        name: name.to_string(),
        hour,
        minute,
        second,
        day_of_week: None,
        kind: JobKind::Report(ReportSpec {
            kind: ReportKind::Daily,
            level,
        }),
    }
}

#[test]
fn next_due_picks_the_earliest_job() {
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    let mut config = AppConfig::default_test();
    config.schedule = vec![
        report_job("operators", 9, 15, 0, Level::Operator),
        report_job("admins", 9, 16, 20, Level::Admin),
        report_job("top_admins", 9, 17, 40, Level::TopAdmin),
    ];
    let scheduler = Scheduler::new(&store, &config, &LogPublisher);

    let now = Kyiv.with_ymd_and_hms(2025, 3, 10, 9, 16, 0).unwrap();
    let (fire, due) = scheduler.next_due(now).unwrap();
    assert_eq!(fire, Kyiv.with_ymd_and_hms(2025, 3, 10, 9, 16, 20).unwrap());
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].name, "admins");
}

#[test]
fn jobs_sharing_a_slot_run_in_schedule_order() {
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    let mut config = AppConfig::default_test();
    config.schedule = vec![
        report_job("first", 9, 15, 0, Level::Operator),
        report_job("second", 9, 15, 0, Level::Admin),
    ];
    let scheduler = Scheduler::new(&store, &config, &LogPublisher);

    let now = Kyiv.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
    let (_, due) = scheduler.next_due(now).unwrap();
    let names: Vec<&str> = due.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn empty_schedule_has_nothing_due() {
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    let config = AppConfig::default_test();
    let scheduler = Scheduler::new(&store, &config, &LogPublisher);

    let now = Kyiv.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
    assert!(scheduler.next_due(now).is_none());
}

#[test]
fn report_job_runs_against_empty_store() {
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    let config = AppConfig::default_test();
    let scheduler = Scheduler::new(&store, &config, &LogPublisher);

    let job = report_job("operators", 9, 15, 0, Level::Operator);
    let fired_at = Kyiv.with_ymd_and_hms(2025, 3, 10, 9, 15, 0).unwrap();
    scheduler
        .run_job(&job, fired_at)
        .expect("an empty leaderboard is not an error");
}
