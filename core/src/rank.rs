//! Ranking and leaderboard rendering.
//!
//! Sorting is descending by rounded total and stable, so entities tied
//! on the displayed amount keep their first-seen order from aggregation.
//! Rendering produces HTML-lite text; `<b>` is the only tag used.

use crate::{
    aggregate::{AggregatedTotal, Level},
    window::ReportKind,
};

#[derive(Debug, Clone)]
pub struct RankedEntry {
    /// 1-based position after sorting.
    pub position: usize,
    pub entry: AggregatedTotal,
}

/// Sort descending by total (stable) and assign positions. `top_n`
/// truncates after ranking, so positions always start at 1.
pub fn rank(mut totals: Vec<AggregatedTotal>, top_n: Option<usize>) -> Vec<RankedEntry> {
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    if let Some(n) = top_n {
        totals.truncate(n);
    }
    totals
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RankedEntry {
            position: i + 1,
            entry,
        })
        .collect()
}

/// A rendered leaderboard, ready to publish.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    pub title: String,
    pub lines: Vec<String>,
}

impl Leaderboard {
    pub fn to_text(&self) -> String {
        let mut out = format!("<b>{}</b>\n\n", self.title);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

pub fn title_for(kind: ReportKind, level: Level) -> String {
    let (emoji, noun) = match level {
        Level::Operator => ("🔥", "рейтинг операторов"),
        Level::Admin => ("🎯", "рейтинг админов"),
        Level::TopAdmin => ("💎", "рейтинг топ админов"),
    };
    let body = match kind {
        ReportKind::Daily => capitalize_first(noun),
        ReportKind::Weekly => format!("Еженедельный {noun}"),
    };
    format!("{emoji}{body}{emoji}")
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Render ranked rows into leaderboard lines.
///
/// Top three rows get medal decorations and bold markup; the rest are
/// numbered. Operator and admin boards insert a blank separator line
/// after position 3. Top-admin boards bold only the leader and always
/// uppercase the name.
pub fn render(kind: ReportKind, level: Level, ranked: &[RankedEntry]) -> Leaderboard {
    let mut lines = Vec::with_capacity(ranked.len() + 1);
    for r in ranked {
        let decoration = match r.position {
            1 => "🏆".to_string(),
            2 => "🥈".to_string(),
            3 => "🥉".to_string(),
            n => format!("{n}."),
        };
        lines.push(render_line(level, r, &decoration));
        if r.position == 3 && level != Level::TopAdmin {
            lines.push(String::new());
        }
    }
    Leaderboard {
        title: title_for(kind, level),
        lines,
    }
}

fn render_line(level: Level, r: &RankedEntry, decoration: &str) -> String {
    let e = &r.entry;
    let total = &e.total;
    match level {
        Level::Operator => {
            let site = e.site.map(|s| s.to_string()).unwrap_or_default();
            let admin = e.admin.as_deref().unwrap_or_default();
            let top_admin = e.top_admin.as_deref().unwrap_or_default();
            if r.position <= 3 {
                format!(
                    "<b>{decoration} {site} ~ {} ({total:.2}$) - {admin} - {top_admin}</b>",
                    e.label.to_uppercase()
                )
            } else {
                format!(
                    "{decoration} {site} ~ {} ({total:.2}$) - {admin} - {top_admin}",
                    e.label
                )
            }
        }
        Level::Admin => {
            let site = e.site.map(|s| s.to_string()).unwrap_or_default();
            let top_admin = e.top_admin.as_deref().unwrap_or_default();
            if r.position <= 3 {
                format!(
                    "<b>{decoration} {site} ~ {} ({total:.2}$) - {top_admin}</b>",
                    e.label
                )
            } else {
                format!(
                    "{decoration} {site} ~ {} ({total:.2}$) - {top_admin}",
                    e.label
                )
            }
        }
        Level::TopAdmin => {
            let name = e.label.to_uppercase();
            if r.position == 1 {
                format!("{decoration} <b>{name} ({total:.2}$)</b>")
            } else {
                format!("{decoration} {name} ({total:.2}$)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn total(label: &str, amount: rust_decimal::Decimal) -> AggregatedTotal {
        AggregatedTotal {
            key: label.to_string(),
            label: label.to_string(),
            site: None,
            admin: None,
            top_admin: None,
            total: amount,
        }
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let ranked = rank(
            vec![
                total("first", dec!(50.00)),
                total("second", dec!(50.00)),
                total("leader", dec!(80.00)),
            ],
            None,
        );
        let labels: Vec<&str> = ranked.iter().map(|r| r.entry.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["leader", "first", "second"],
            "stable sort must preserve input order among equals"
        );
    }

    #[test]
    fn top_n_truncates_after_ranking() {
        let totals: Vec<_> = (0..5)
            .map(|i| total(&format!("op{i}"), rust_decimal::Decimal::from(i)))
            .collect();
        let ranked = rank(totals, Some(2));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].position, 1);
        assert_eq!(ranked[0].entry.label, "op4");
    }

    #[test]
    fn top_admin_board_bolds_only_the_leader() {
        let ranked = rank(
            vec![total("alpha", dec!(10)), total("beta", dec!(5))],
            None,
        );
        let board = render(ReportKind::Daily, Level::TopAdmin, &ranked);
        assert!(board.lines[0].contains("<b>ALPHA (10.00$)</b>"));
        assert!(!board.lines[1].contains("<b>"));
        assert!(board.lines[1].contains("BETA (5.00$)"));
    }
}
