//! Wall-clock job scheduler.
//!
//! Jobs fire at fixed local times (optionally gated on a weekday) in the
//! configured time zone. Fire times are computed in local wall-clock
//! terms, so a job scheduled for 09:15 fires at 09:15 on either side of
//! a DST transition. The nominal fire time, not the actual wall clock,
//! is what a report job receives as its window reference; a run that
//! starts late still covers the scheduled window.
//!
//! Execution is sequential and fail-soft: a failing job is logged and
//! the loop moves on to the next fire time.

use crate::{
    config::AppConfig,
    delivery::Publisher,
    error::CoreResult,
    report::{run_report, ReportSpec},
    store::LedgerStore,
};
use chrono::{DateTime, Datelike, Days, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Report(ReportSpec),
    RetentionSweep,
}

#[derive(Debug, Clone)]
pub struct JobSpec {
    pub name: String,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// None fires every day.
    pub day_of_week: Option<Weekday>,
    pub kind: JobKind,
}

impl JobSpec {
    /// The next local instant strictly after `now` at which this job
    /// fires. Returns None only when the local fire time does not exist
    /// on any candidate day (a spring-forward gap on every one of them,
    /// which cannot happen for a sane schedule).
    pub fn next_fire_after(&self, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, self.second)?;
        // Two weeks of candidates covers any weekday gate plus a skipped
        // DST gap day.
        for offset in 0..=14u64 {
            let date = now.date_naive().checked_add_days(Days::new(offset))?;
            if let Some(required) = self.day_of_week {
                if date.weekday() != required {
                    continue;
                }
            }
            let fire = match tz.from_local_datetime(&date.and_time(time)).earliest() {
                Some(f) => f,
                None => continue, // local time skipped by DST on this date
            };
            if fire > now {
                return Some(fire);
            }
        }
        None
    }
}

pub struct Scheduler<'a> {
    store: &'a LedgerStore,
    config: &'a AppConfig,
    publisher: &'a dyn Publisher,
}

impl<'a> Scheduler<'a> {
    pub fn new(store: &'a LedgerStore, config: &'a AppConfig, publisher: &'a dyn Publisher) -> Self {
        Self {
            store,
            config,
            publisher,
        }
    }

    /// All jobs due next, with their shared fire instant. Several jobs
    /// can tie (same wall-clock slot); they run in schedule order.
    pub fn next_due(&self, now: DateTime<Tz>) -> Option<(DateTime<Tz>, Vec<&JobSpec>)> {
        let mut best: Option<(DateTime<Tz>, Vec<&JobSpec>)> = None;
        for job in &self.config.schedule {
            let Some(fire) = job.next_fire_after(now) else {
                continue;
            };
            match best {
                Some((t, ref mut due)) if fire == t => due.push(job),
                Some((t, _)) if fire < t => best = Some((fire, vec![job])),
                None => best = Some((fire, vec![job])),
                _ => {}
            }
        }
        best
    }

    /// Execute one job with `fired_at` as its nominal fire time.
    pub fn run_job(&self, job: &JobSpec, fired_at: DateTime<Tz>) -> CoreResult<()> {
        match job.kind {
            JobKind::Report(spec) => {
                run_report(self.store, self.config, self.publisher, spec, fired_at)?;
            }
            JobKind::RetentionSweep => {
                // Instant arithmetic: a calendar-day subtraction has no
                // answer when the resulting local time falls in a DST
                // gap or fold, and the horizon is defined in absolute
                // time anyway.
                let cutoff = fired_at - chrono::Duration::days(self.config.retention_days);
                let removed = self.store.delete_entries_before(cutoff.timestamp())?;
                log::info!(
                    "retention sweep removed {removed} entries older than {}",
                    cutoff.format("%Y-%m-%d %H:%M:%S %Z")
                );
            }
        }
        Ok(())
    }

    /// Run forever: sleep until the next fire time, execute everything
    /// due, repeat. Job failures are logged and never stop the loop.
    pub fn run(&self) -> CoreResult<()> {
        log::info!(
            "scheduler started with {} jobs in {}",
            self.config.schedule.len(),
            self.config.timezone
        );
        loop {
            let now = Utc::now().with_timezone(&self.config.timezone);
            let Some((fire, due)) = self.next_due(now) else {
                log::warn!("schedule is empty, scheduler exiting");
                return Ok(());
            };
            let wait = (fire - now).to_std().unwrap_or(Duration::ZERO);
            log::debug!(
                "next fire {} ({} jobs), sleeping {:.0?}",
                fire.format("%Y-%m-%d %H:%M:%S %Z"),
                due.len(),
                wait
            );
            std::thread::sleep(wait);
            for job in due {
                if let Err(e) = self.run_job(job, fire) {
                    log::error!("job '{}' failed: {e}", job.name);
                }
            }
        }
    }
}
