//! Windowed aggregation and hierarchy rollups.
//!
//! One generic aggregator serves all three hierarchy levels. Operator
//! sums are kept at full precision while rolling up; rounding happens
//! exactly once, at the requested level, after summation.
//!
//! Pure read over a store snapshot: no side effects, idempotent.

use crate::{
    config::AdminMapping,
    error::CoreResult,
    store::{BalanceEntry, Operator},
    types::Site,
    window::Window,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Operator,
    Admin,
    TopAdmin,
}

/// One aggregated row: an entity key, its rounded windowed total, and the
/// denormalized display fields the renderer needs. Ephemeral, produced
/// per report run and discarded after formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedTotal {
    pub key: String,
    /// Display name: operator nickname, admin name, or top-admin name.
    pub label: String,
    pub site: Option<Site>,
    pub admin: Option<String>,
    pub top_admin: Option<String>,
    /// Rounded to 2 decimal places, half away from zero.
    pub total: Decimal,
}

/// Round a monetary total for display/ranking. Half away from zero:
/// 30.005 rounds to 30.01, -30.005 to -30.01.
pub fn round_total(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Aggregate windowed entry sums at the requested hierarchy level.
///
/// Output order is the first-seen order of the input operators, which
/// makes downstream tie-breaking deterministic. Every operator appears
/// at the operator level even with no matching entries (total 0.00);
/// admin/top-admin levels list every distinct entity among the
/// operators. An operator whose admin id is missing from `mapping` is a
/// configuration error, never silently dropped.
pub fn aggregate(
    operators: &[Operator],
    entries: &[BalanceEntry],
    window: &Window,
    level: Level,
    mapping: &AdminMapping,
) -> CoreResult<Vec<AggregatedTotal>> {
    // Full-precision windowed sum per operator.
    let mut raw: HashMap<i64, Decimal> = HashMap::new();
    for entry in entries {
        if window.contains(entry.ts) {
            *raw.entry(entry.operator_id).or_insert(Decimal::ZERO) += entry.amount;
        }
    }
    let operator_sums: Vec<(&Operator, Decimal)> = operators
        .iter()
        .map(|op| (op, raw.get(&op.id).copied().unwrap_or(Decimal::ZERO)))
        .collect();

    match level {
        Level::Operator => Ok(operator_sums
            .into_iter()
            .map(|(op, sum)| AggregatedTotal {
                key: op.id.to_string(),
                label: op.nickname.clone(),
                site: Some(op.site),
                admin: Some(op.admin_id.clone()),
                top_admin: Some(op.top_admin.clone()),
                total: round_total(sum),
            })
            .collect()),

        Level::Admin => {
            let rolled = roll_up(&operator_sums, mapping, |op| Ok(op.admin_id.clone()))?;
            Ok(rolled
                .into_iter()
                .map(|acc| AggregatedTotal {
                    key: acc.key.clone(),
                    label: acc.key,
                    site: Some(acc.site),
                    admin: None,
                    top_admin: Some(acc.top_admin),
                    total: round_total(acc.sum),
                })
                .collect())
        }

        Level::TopAdmin => {
            let rolled = roll_up(&operator_sums, mapping, |op| {
                mapping.resolve(&op.admin_id).map(str::to_string)
            })?;
            Ok(rolled
                .into_iter()
                .map(|acc| AggregatedTotal {
                    key: acc.key.clone(),
                    label: acc.key,
                    site: None,
                    admin: None,
                    top_admin: None,
                    total: round_total(acc.sum),
                })
                .collect())
        }
    }
}

struct RollupAcc {
    key: String,
    site: Site,
    top_admin: String,
    sum: Decimal,
}

/// Group full-precision operator sums under a parent key, preserving
/// first-seen order. Display fields come from the first operator seen
/// under each key. The admin mapping is consulted for every operator so
/// an unmapped admin fails the run even when grouping by admin id.
fn roll_up<K>(
    operator_sums: &[(&Operator, Decimal)],
    mapping: &AdminMapping,
    key_of: K,
) -> CoreResult<Vec<RollupAcc>>
where
    K: Fn(&Operator) -> CoreResult<String>,
{
    let mut order: Vec<RollupAcc> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for &(op, sum) in operator_sums {
        let top_admin = mapping.resolve(&op.admin_id)?.to_string();
        let key = key_of(op)?;
        match index.get(&key) {
            Some(&i) => order[i].sum += sum,
            None => {
                index.insert(key.clone(), order.len());
                order.push(RollupAcc {
                    key,
                    site: op.site,
                    top_admin,
                    sum,
                });
            }
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{compute_window, ReportKind};
    use chrono::{NaiveTime, TimeZone};
    use chrono_tz::Europe::Kyiv;
    use rust_decimal_macros::dec;

    #[test]
    fn rounding_is_half_away_from_zero() {
        // Midpoint ties round away from zero, non-ties round normally.
        assert_eq!(round_total(dec!(30.005)), dec!(30.01));
        assert_eq!(round_total(dec!(-30.005)), dec!(-30.01));
        assert_eq!(round_total(dec!(30.004)), dec!(30.00));
        assert_eq!(round_total(dec!(30.006)), dec!(30.01));
    }

    fn operator(id: i64, nickname: &str, admin_id: &str) -> Operator {
        Operator {
            id,
            external_id: id,
            nickname: nickname.to_string(),
            admin_id: admin_id.to_string(),
            top_admin: "Deadpool".to_string(),
            site: Site::Lf,
            shift: "day".to_string(),
        }
    }

    fn entry(id: i64, operator_id: i64, amount: Decimal, ts: i64) -> BalanceEntry {
        BalanceEntry {
            id,
            operator_id,
            amount,
            draft: amount.to_string(),
            ts,
        }
    }

    #[test]
    fn admin_rollup_rounds_once_after_summing() {
        let reference = Kyiv.with_ymd_and_hms(2025, 3, 10, 9, 16, 0).unwrap();
        let boundary = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let window = compute_window(reference, ReportKind::Daily, boundary);
        let ts = Kyiv
            .with_ymd_and_hms(2025, 3, 9, 14, 0, 0)
            .unwrap()
            .timestamp();

        let operators = vec![
            operator(1, "one", "Tanos"),
            operator(2, "two", "Tanos"),
            operator(3, "three", "Tanos"),
        ];
        let entries = vec![
            entry(1, 1, dec!(10.00), ts),
            entry(2, 2, dec!(20.00), ts),
            entry(3, 3, dec!(30.005), ts),
        ];
        let mapping = crate::config::AppConfig::default_test().admin_map;

        let totals = aggregate(&operators, &entries, &window, Level::Admin, &mapping).unwrap();
        assert_eq!(totals.len(), 1);
        // 60.005 rounded once, not 10.00 + 20.00 + 30.01.
        assert_eq!(totals[0].total, dec!(60.01));

        let again = aggregate(&operators, &entries, &window, Level::Admin, &mapping).unwrap();
        assert_eq!(totals, again, "aggregation is a pure function");
    }

    #[test]
    fn operator_with_no_entries_still_appears() {
        let reference = Kyiv.with_ymd_and_hms(2025, 3, 10, 9, 15, 0).unwrap();
        let boundary = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let window = compute_window(reference, ReportKind::Daily, boundary);

        let operators = vec![operator(1, "idle", "Tanos")];
        let mapping = crate::config::AppConfig::default_test().admin_map;
        let totals =
            aggregate(&operators, &[], &window, Level::Operator, &mapping).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total, Decimal::ZERO);
    }

    #[test]
    fn unmapped_admin_fails_the_rollup() {
        let reference = Kyiv.with_ymd_and_hms(2025, 3, 10, 9, 17, 40).unwrap();
        let boundary = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let window = compute_window(reference, ReportKind::Daily, boundary);

        let operators = vec![operator(1, "lost", "Nobody")];
        let mapping = crate::config::AppConfig::default_test().admin_map;
        let err = aggregate(&operators, &[], &window, Level::TopAdmin, &mapping);
        assert!(matches!(
            err,
            Err(crate::error::CoreError::UnmappedAdmin { .. })
        ));
    }
}
