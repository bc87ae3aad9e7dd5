//! Report orchestration: snapshot → window → aggregate → rank → render
//! → publish.
//!
//! A report run is a pure function of the store snapshot, the config and
//! the nominal reference time, so a run delayed past its scheduled fire
//! time still produces the same leaderboard as an on-time run.

use crate::{
    aggregate::{self, Level},
    config::AppConfig,
    delivery::Publisher,
    error::CoreResult,
    rank,
    store::LedgerStore,
    window::{compute_window, ReportKind},
};
use chrono::DateTime;
use chrono_tz::Tz;

/// Which of the six leaderboard variants to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSpec {
    pub kind: ReportKind,
    pub level: Level,
}

impl ReportSpec {
    pub fn title(&self) -> String {
        rank::title_for(self.kind, self.level)
    }
}

/// Run one report against the current store contents.
///
/// `reference` is the nominal fire time, not the actual wall clock.
/// Publishing is best effort: a delivery failure is logged and the
/// rendered leaderboard is still returned.
pub fn run_report(
    store: &LedgerStore,
    config: &AppConfig,
    publisher: &dyn Publisher,
    spec: ReportSpec,
    reference: DateTime<Tz>,
) -> CoreResult<rank::Leaderboard> {
    let window = compute_window(reference, spec.kind, config.day_boundary);
    let snapshot = store.snapshot()?;

    let totals = match aggregate::aggregate(
        &snapshot.operators,
        &snapshot.entries,
        &window,
        spec.level,
        &config.admin_map,
    ) {
        Ok(t) => t,
        Err(e) => {
            log::error!(
                "report {:?}/{:?} over {} failed: {e}",
                spec.kind,
                spec.level,
                window.describe()
            );
            return Err(e);
        }
    };

    // Top-N applies only to the operator board; admin boards are short
    // enough to publish whole.
    let top_n = match spec.level {
        Level::Operator => Some(config.top_n),
        Level::Admin | Level::TopAdmin => None,
    };
    let ranked = rank::rank(totals, top_n);
    let board = rank::render(spec.kind, spec.level, &ranked);

    if let Err(e) = publisher.publish(&config.channel_id, &board.to_text(), true) {
        log::warn!("leaderboard publish failed, continuing: {e}");
    }
    log::info!(
        "published {:?}/{:?} board, {} rows, window {}",
        spec.kind,
        spec.level,
        ranked.len(),
        window.describe()
    );
    Ok(board)
}
