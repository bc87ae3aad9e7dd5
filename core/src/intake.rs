//! Balance intake: registration, shift-close recording, corrections.
//!
//! All writes go through here so the minute-truncation and group-notice
//! rules are applied in exactly one place.

use crate::{
    config::AppConfig,
    delivery::Publisher,
    error::{CoreError, CoreResult},
    store::LedgerStore,
    types::{EntryId, ExternalId, OperatorId},
};
use rust_decimal::Decimal;

pub struct Intake<'a> {
    store: &'a LedgerStore,
    config: &'a AppConfig,
    publisher: &'a dyn Publisher,
}

impl<'a> Intake<'a> {
    pub fn new(store: &'a LedgerStore, config: &'a AppConfig, publisher: &'a dyn Publisher) -> Self {
        Self {
            store,
            config,
            publisher,
        }
    }

    /// Register an operator under an admin. Re-registering the same
    /// external id replaces the old record and drops its entry history.
    /// The admin must have a top-admin assignment; checked here so a
    /// roster mistake surfaces at registration, not at the next report.
    pub fn register_operator(
        &self,
        external_id: ExternalId,
        nickname: &str,
        admin_id: &str,
        site: crate::types::Site,
        shift: &str,
    ) -> CoreResult<OperatorId> {
        let top_admin = self.config.admin_map.resolve(admin_id)?.to_string();
        let id = self
            .store
            .replace_operator(external_id, nickname, admin_id, &top_admin, site, shift)?;
        log::info!("registered operator '{nickname}' (external id {external_id}) under {admin_id}/{top_admin}");
        Ok(id)
    }

    /// Record a shift-close balance for the operator. `ts` is unix
    /// seconds; it is truncated to the minute before storage. Publishes
    /// a shift-finished notice to the group, best effort.
    pub fn record_balance(
        &self,
        external_id: ExternalId,
        amount: Decimal,
        draft: &str,
        ts: i64,
    ) -> CoreResult<EntryId> {
        let operator = self
            .store
            .operator_by_external_id(external_id)?
            .ok_or(CoreError::OperatorNotFound { external_id })?;
        let ts = ts - ts.rem_euclid(60);
        let entry_id = self.store.insert_entry(operator.id, amount, draft, ts)?;

        let notice = format!(
            "✅ <b>Смена завершена!</b>\n\
             <b>- Имя:</b> {}\n\
             <b>- Смена:</b> {} ({})\n\
             <b>- Администратор:</b> {}\n\
             <b>- Баланс:</b> {}",
            operator.nickname,
            operator.shift,
            operator.site,
            operator.admin_id,
            format_draft(draft)
        );
        if let Err(e) = self.publisher.publish(&self.config.channel_id, &notice, true) {
            log::warn!("shift-finished notice failed, entry {entry_id} kept: {e}");
        }
        Ok(entry_id)
    }

    /// Undo the operator's most recent balance entry. Errors when the
    /// operator is unknown or has nothing to remove.
    pub fn remove_last_balance(&self, external_id: ExternalId) -> CoreResult<EntryId> {
        let operator = self
            .store
            .operator_by_external_id(external_id)?
            .ok_or(CoreError::OperatorNotFound { external_id })?;
        match self.store.remove_last_entry(operator.id)? {
            Some(id) => {
                log::info!("removed entry {id} for operator '{}'", operator.nickname);
                Ok(id)
            }
            None => Err(CoreError::NoEntries {
                operator_id: operator.id,
            }),
        }
    }

    /// Drop an operator and all of their history. Returns false when no
    /// such operator was registered.
    pub fn reset_operator(&self, external_id: ExternalId) -> CoreResult<bool> {
        let removed = self.store.delete_operator(external_id)?;
        if removed {
            log::info!("reset operator with external id {external_id}");
        }
        Ok(removed)
    }
}

/// Pretty-print a raw balance draft for the group notice: each
/// '+'-separated component is trimmed, "кс" is uppercased, the decimal
/// point becomes a comma, and a dollar sign is appended.
/// "50.5 + 12кс" becomes "50,5$ + 12КС$".
pub fn format_draft(draft: &str) -> String {
    draft
        .split('+')
        .map(|part| {
            let part = part.trim().replace("кс", "КС").replace('.', ",");
            format!("{part}$")
        })
        .collect::<Vec<_>>()
        .join(" + ")
}
