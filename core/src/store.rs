//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Intake, reports and the scheduler call store methods; they never
//! execute SQL directly. Every multi-statement mutation runs inside a
//! fail-fast transaction that rolls back fully on error.

use crate::{
    error::CoreResult,
    types::{EntryId, ExternalId, OperatorId, Site},
};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: OperatorId,
    pub external_id: ExternalId,
    pub nickname: String,
    pub admin_id: String,
    pub top_admin: String,
    pub site: Site,
    pub shift: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceEntry {
    pub id: EntryId,
    pub operator_id: OperatorId,
    pub amount: Decimal,
    pub draft: String,
    /// Unix seconds (UTC), minute precision.
    pub ts: i64,
}

/// A consistent read of everything a report needs, taken in one
/// transaction so a concurrent retention sweep can never expose a
/// half-deleted state to the aggregator.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub operators: Vec<Operator>,
    pub entries: Vec<BalanceEntry>,
}

pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    pub fn open(path: &str) -> CoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CoreResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Operators ──────────────────────────────────────────────

    /// Register an operator, replacing any previous registration for the
    /// same external id. The replacement cascades the old operator's
    /// entries away inside the same transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn replace_operator(
        &self,
        external_id: ExternalId,
        nickname: &str,
        admin_id: &str,
        top_admin: &str,
        site: Site,
        shift: &str,
    ) -> CoreResult<OperatorId> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM operators WHERE external_id = ?1",
            params![external_id],
        )?;
        tx.execute(
            "INSERT INTO operators (external_id, nickname, admin_id, top_admin, site, shift)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                external_id,
                nickname,
                admin_id,
                top_admin,
                site.to_string(),
                shift
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    pub fn operator_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> CoreResult<Option<Operator>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, external_id, nickname, admin_id, top_admin, site, shift
             FROM operators WHERE external_id = ?1",
        )?;
        let op = stmt
            .query_row(params![external_id], operator_row_mapper)
            .optional()?;
        Ok(op)
    }

    pub fn all_operators(&self) -> CoreResult<Vec<Operator>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, external_id, nickname, admin_id, top_admin, site, shift
             FROM operators ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], operator_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an operator and (via FK cascade) all of its entries.
    /// Returns false when no such operator existed.
    pub fn delete_operator(&self, external_id: ExternalId) -> CoreResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let n = tx.execute(
            "DELETE FROM operators WHERE external_id = ?1",
            params![external_id],
        )?;
        tx.commit()?;
        Ok(n > 0)
    }

    pub fn operator_count(&self) -> CoreResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM operators", [], |row| row.get(0))
            .map_err(Into::into)
    }

    // ── Balance entries ────────────────────────────────────────

    pub fn insert_entry(
        &self,
        operator_id: OperatorId,
        amount: Decimal,
        draft: &str,
        ts: i64,
    ) -> CoreResult<EntryId> {
        self.conn.execute(
            "INSERT INTO balance_entries (operator_id, amount, draft, ts)
             VALUES (?1, ?2, ?3, ?4)",
            params![operator_id, amount.to_string(), draft, ts],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The operator's most recent entry. "Most recent" is governed by
    /// timestamp first, insertion order as tiebreak: entries are
    /// minute-truncated so same-minute appends tie on ts.
    pub fn latest_entry(&self, operator_id: OperatorId) -> CoreResult<Option<BalanceEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, operator_id, amount, draft, ts
             FROM balance_entries WHERE operator_id = ?1
             ORDER BY ts DESC, id DESC LIMIT 1",
        )?;
        let entry = stmt
            .query_row(params![operator_id], entry_row_mapper)
            .optional()?;
        Ok(entry)
    }

    /// Delete the operator's most recent entry. Returns the deleted
    /// entry's id, or None when the operator has no entries.
    pub fn remove_last_entry(&self, operator_id: OperatorId) -> CoreResult<Option<EntryId>> {
        let tx = self.conn.unchecked_transaction()?;
        let id: Option<EntryId> = tx
            .query_row(
                "SELECT id FROM balance_entries WHERE operator_id = ?1
                 ORDER BY ts DESC, id DESC LIMIT 1",
                params![operator_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = id {
            tx.execute("DELETE FROM balance_entries WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(id)
    }

    /// Retention sweep: delete every entry strictly older than `cutoff_ts`.
    /// Returns the number of rows removed. Single statement, so reports
    /// reading through [`snapshot`](Self::snapshot) never see it half done.
    pub fn delete_entries_before(&self, cutoff_ts: i64) -> CoreResult<usize> {
        let n = self.conn.execute(
            "DELETE FROM balance_entries WHERE ts < ?1",
            params![cutoff_ts],
        )?;
        Ok(n)
    }

    pub fn entries_for_operator(&self, operator_id: OperatorId) -> CoreResult<Vec<BalanceEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, operator_id, amount, draft, ts
             FROM balance_entries WHERE operator_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![operator_id], entry_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn entry_count(&self) -> CoreResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM balance_entries", [], |row| row.get(0))
            .map_err(Into::into)
    }

    // ── Report snapshot ────────────────────────────────────────

    /// Read operators and all retained entries in one transaction.
    /// Aggregation works off this snapshot only; it never streams rows
    /// while other statements may be mutating the tables.
    pub fn snapshot(&self) -> CoreResult<Snapshot> {
        let tx = self.conn.unchecked_transaction()?;
        let operators = {
            let mut stmt = tx.prepare(
                "SELECT id, external_id, nickname, admin_id, top_admin, site, shift
                 FROM operators ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], operator_row_mapper)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        let entries = {
            let mut stmt = tx.prepare(
                "SELECT id, operator_id, amount, draft, ts
                 FROM balance_entries ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], entry_row_mapper)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        tx.commit()?;
        Ok(Snapshot { operators, entries })
    }
}

fn operator_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Operator> {
    let site_text: String = row.get(5)?;
    let site = Site::from_str(&site_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
    })?;
    Ok(Operator {
        id: row.get(0)?,
        external_id: row.get(1)?,
        nickname: row.get(2)?,
        admin_id: row.get(3)?,
        top_admin: row.get(4)?,
        site,
        shift: row.get(6)?,
    })
}

fn entry_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<BalanceEntry> {
    let amount_text: String = row.get(2)?;
    let amount = Decimal::from_str(&amount_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
    })?;
    Ok(BalanceEntry {
        id: row.get(0)?,
        operator_id: row.get(1)?,
        amount,
        draft: row.get(3)?,
        ts: row.get(4)?,
    })
}
