use crate::{
    error::{CoreError, CoreResult},
    scheduler::{JobKind, JobSpec},
    window::ReportKind,
};
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Admin → top-admin assignments. Hot-edited by operations, so it lives
/// in a data file rather than in code.
#[derive(Debug, Clone, Default)]
pub struct AdminMapping {
    assignments: HashMap<String, String>,
}

impl AdminMapping {
    pub fn new(assignments: HashMap<String, String>) -> Self {
        Self { assignments }
    }

    /// Resolve an admin id to its top-admin. Missing assignments are a
    /// hard error so a misconfigured roster is caught at intake or at
    /// the first report, never papered over with an "unknown" bucket.
    pub fn resolve(&self, admin_id: &str) -> CoreResult<&str> {
        self.assignments
            .get(admin_id)
            .map(String::as_str)
            .ok_or_else(|| CoreError::UnmappedAdmin {
                admin_id: admin_id.to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AdminMapFile {
    admins: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduleFile {
    timezone: String,
    day_boundary: String,
    retention_days: i64,
    top_n: usize,
    channel_id: String,
    jobs: Vec<JobFileEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct JobFileEntry {
    name: String,
    hour: u32,
    minute: u32,
    #[serde(default)]
    second: u32,
    #[serde(default)]
    day_of_week: Option<String>,
    job: JobKindFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
enum JobKindFile {
    Report {
        kind: ReportKind,
        level: crate::aggregate::Level,
    },
    RetentionSweep,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Time zone all windows and schedules are interpreted in.
    pub timezone: Tz,
    /// Wall-clock instant the business day rolls over (default 09:00).
    pub day_boundary: NaiveTime,
    /// Entries older than this many days are swept.
    pub retention_days: i64,
    /// Operator leaderboards show at most this many rows.
    pub top_n: usize,
    /// Destination channel for published leaderboards.
    pub channel_id: String,
    pub admin_map: AdminMapping,
    pub schedule: Vec<JobSpec>,
}

impl AppConfig {
    /// Load from the data/ directory.
    /// In tests, use AppConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let map_path = format!("{data_dir}/admin_map.json");
        let map_content = std::fs::read_to_string(&map_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {map_path}: {e}"))?;
        let map_file: AdminMapFile = serde_json::from_str(&map_content)?;

        let schedule_path = format!("{data_dir}/schedule.json");
        let schedule_content = std::fs::read_to_string(&schedule_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {schedule_path}: {e}"))?;
        let schedule_file: ScheduleFile = serde_json::from_str(&schedule_content)?;

        let timezone = Tz::from_str(&schedule_file.timezone)
            .map_err(|e| anyhow::anyhow!("Bad timezone '{}': {e}", schedule_file.timezone))?;
        let day_boundary = NaiveTime::parse_from_str(&schedule_file.day_boundary, "%H:%M")
            .map_err(|e| {
                anyhow::anyhow!("Bad day_boundary '{}': {e}", schedule_file.day_boundary)
            })?;

        let mut schedule = Vec::with_capacity(schedule_file.jobs.len());
        for entry in schedule_file.jobs {
            schedule.push(job_from_file(entry)?);
        }

        Ok(Self {
            timezone,
            day_boundary,
            retention_days: schedule_file.retention_days,
            top_n: schedule_file.top_n,
            channel_id: schedule_file.channel_id,
            admin_map: AdminMapping::new(map_file.admins),
            schedule,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let admin_map = AdminMapping::new(
            [
                ("Tanos".to_string(), "Deadpool".to_string()),
                ("Leviks".to_string(), "Deadpool".to_string()),
                ("Guts".to_string(), "Stern".to_string()),
                ("Griffit".to_string(), "Creator".to_string()),
            ]
            .into(),
        );
        Self {
            timezone: chrono_tz::Europe::Kyiv,
            day_boundary: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            retention_days: 9,
            top_n: 10,
            channel_id: "leaderboard".to_string(),
            admin_map,
            schedule: Vec::new(),
        }
    }
}

fn job_from_file(entry: JobFileEntry) -> anyhow::Result<JobSpec> {
    let day_of_week = match entry.day_of_week {
        Some(d) => Some(
            Weekday::from_str(&d)
                .map_err(|_| anyhow::anyhow!("Bad day_of_week '{d}' in job '{}'", entry.name))?,
        ),
        None => None,
    };
    if entry.hour > 23 || entry.minute > 59 || entry.second > 59 {
        anyhow::bail!(
            "Bad fire time {:02}:{:02}:{:02} in job '{}'",
            entry.hour,
            entry.minute,
            entry.second,
            entry.name
        );
    }
    let kind = match entry.job {
        JobKindFile::Report { kind, level } => JobKind::Report(crate::report::ReportSpec {
            kind,
            level,
        }),
        JobKindFile::RetentionSweep => JobKind::RetentionSweep,
    };
    Ok(JobSpec {
        name: entry.name,
        hour: entry.hour,
        minute: entry.minute,
        second: entry.second,
        day_of_week,
        kind,
    })
}
