//! shift-runner: headless leaderboard scheduler for the shift-balance
//! rating engine.
//!
//! Usage:
//!   shift-runner --db ratings.db --data-dir ./data
//!   shift-runner --db ratings.db --report daily --level operator
//!   shift-runner --db ratings.db --sweep
//!   shift-runner --db ratings.db --seed-demo

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use shiftrank_core::{
    aggregate::Level,
    config::AppConfig,
    delivery::LogPublisher,
    intake::Intake,
    report::{run_report, ReportSpec},
    scheduler::Scheduler,
    store::LedgerStore,
    types::Site,
    window::ReportKind,
};
use std::env;
use std::str::FromStr;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let report = arg_value(&args, "--report");
    let level = arg_value(&args, "--level");
    let sweep = args.iter().any(|a| a == "--sweep");
    let seed_demo = args.iter().any(|a| a == "--seed-demo");

    println!("shift-runner");
    println!("  db:        {db}");
    println!("  data_dir:  {data_dir}");
    println!();

    let config = AppConfig::load(data_dir)?;
    let store = LedgerStore::open(db)?;
    store.migrate()?;
    let publisher = LogPublisher;

    if seed_demo {
        seed_demo_data(&store, &config, &publisher)?;
        println!(
            "seeded demo data: {} operators, {} entries",
            store.operator_count()?,
            store.entry_count()?
        );
        return Ok(());
    }

    let now = Utc::now().with_timezone(&config.timezone);

    if sweep {
        let scheduler = Scheduler::new(&store, &config, &publisher);
        let job = config
            .schedule
            .iter()
            .find(|j| matches!(j.kind, shiftrank_core::scheduler::JobKind::RetentionSweep))
            .ok_or_else(|| anyhow::anyhow!("no retention_sweep job in schedule"))?;
        scheduler.run_job(job, now)?;
        return Ok(());
    }

    if let Some(report) = report {
        let kind = match report {
            "daily" => ReportKind::Daily,
            "weekly" => ReportKind::Weekly,
            other => anyhow::bail!("unknown report kind '{other}' (daily|weekly)"),
        };
        let level = match level.unwrap_or("operator") {
            "operator" => Level::Operator,
            "admin" => Level::Admin,
            "top_admin" => Level::TopAdmin,
            other => anyhow::bail!("unknown level '{other}' (operator|admin|top_admin)"),
        };
        let board = run_report(&store, &config, &publisher, ReportSpec { kind, level }, now)?;
        println!("{}", board.to_text());
        return Ok(());
    }

    let scheduler = Scheduler::new(&store, &config, &publisher);
    scheduler.run()?;
    Ok(())
}

/// A handful of operators and entries so one-shot reports have something
/// to show.
fn seed_demo_data(store: &LedgerStore, config: &AppConfig, publisher: &LogPublisher) -> Result<()> {
    let intake = Intake::new(store, config, publisher);
    let now = Utc::now().timestamp();

    let roster = [
        (1001, "phoenix", "Tanos", Site::Lf, "night"),
        (1002, "mirage", "Tanos", Site::Mv, "day"),
        (1003, "vortex", "Guts", Site::Lf, "day"),
        (1004, "zephyr", "Griffit", Site::Mv, "night"),
    ];
    for (external_id, nickname, admin, site, shift) in roster {
        intake.register_operator(external_id, nickname, admin, site, shift)?;
    }

    let entries = [
        (1001, "120.50", "120.5", 26 * 3600),
        (1002, "89.99", "89.99", 20 * 3600),
        (1003, "150.00", "100 + 50", 14 * 3600),
        (1004, "75.25", "75.25", 8 * 3600),
    ];
    for (external_id, amount, draft, age_secs) in entries {
        let amount = Decimal::from_str(amount)?;
        intake.record_balance(external_id, amount, draft, now - age_secs)?;
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
