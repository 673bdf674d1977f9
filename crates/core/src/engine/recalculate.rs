//! Balance recalculation and its post-mutation trigger.

use stockledger_shared::config::RecalculationMode;
use stockledger_shared::types::AccountId;
use tracing::{debug, error, info};

use crate::balance::{BalanceReplayer, RecalculationReport};
use crate::engine::{LedgerEngine, require_account};
use crate::error::{LedgerError, LedgerResult};
use crate::model::{Account, Movement, MovementOrder};

impl LedgerEngine {
    /// Replays the account's history and commits every differing
    /// `balance_after` plus the account balance as one batch.
    ///
    /// Idempotent: a consistent account produces zero writes. This is the
    /// only writer of `balance` and `balance_after`.
    pub async fn recalculate(&self, account_id: AccountId) -> LedgerResult<RecalculationReport> {
        let mut txn = self.store.begin().await?;
        let mut account = require_account(txn.as_mut(), account_id).await?;
        let mut movements = txn
            .movements_for_account(account_id, MovementOrder::Asc)
            .await?;

        let plan = BalanceReplayer::replay(&account, &movements)?;
        if plan.is_empty() {
            debug!(account_id = %account_id, balance = %plan.balance, "Account already consistent");
            return Ok(plan.report());
        }

        let patched = plan.apply(&mut account, &mut movements);
        if patched.len() != plan.movement_updates.len() {
            return Err(drift(
                account_id,
                format!(
                    "{} of {} planned movement updates matched the snapshot",
                    patched.len(),
                    plan.movement_updates.len()
                ),
            ));
        }
        verify_consistent(&account, &movements)?;

        for index in patched {
            txn.save_movement(&movements[index]).await?;
        }
        if plan.account_update.is_some() {
            txn.save_account(&account).await?;
        }
        txn.commit().await?;

        info!(
            account_id = %account_id,
            balance = %plan.balance,
            movements_updated = plan.movement_updates.len(),
            account_updated = plan.account_update.is_some(),
            "Account recalculated"
        );
        Ok(plan.report())
    }

    /// Runs the follow-up recalculation according to the configured mode.
    ///
    /// Returns the report only for a successful inline run. Failures are
    /// logged; the mutation stays committed and a later recalculation
    /// converges.
    pub(crate) async fn after_mutation(&self, account_id: AccountId) -> Option<RecalculationReport> {
        match self.config.recalculation {
            RecalculationMode::Inline => self.recalculate_with_retry(account_id).await,
            RecalculationMode::Deferred => {
                let engine = self.clone();
                tokio::spawn(async move {
                    engine.recalculate_with_retry(account_id).await;
                });
                None
            }
        }
    }

    async fn recalculate_with_retry(&self, account_id: AccountId) -> Option<RecalculationReport> {
        match self.with_retry(|| self.recalculate(account_id)).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(
                    account_id = %account_id,
                    error = %e,
                    "Recalculation failed after committed mutation"
                );
                None
            }
        }
    }
}

/// Re-folds a patched snapshot; anything left to write is drift.
fn verify_consistent(account: &Account, movements: &[Movement]) -> LedgerResult<()> {
    let residual = BalanceReplayer::replay(account, movements)?;
    if residual.is_empty() {
        return Ok(());
    }
    Err(drift(
        account.id,
        format!(
            "{} movement(s) still differ, account balance {} vs fold {}",
            residual.movement_updates.len(),
            account.balance,
            residual.balance
        ),
    ))
}

fn drift(account: AccountId, detail: String) -> LedgerError {
    error!(account_id = %account, detail = %detail, "Recalculation drift detected");
    LedgerError::RecalculationDrift { account, detail }
}
