//! Ledger operations on a single balance row, always executed inside a transaction.

use tracing::debug;

use super::domain::{BalanceKey, LeaveBalance};
use super::error::LeaveServiceError;
use super::store::LeaveTransaction;

/// Load the balance for `key`, creating it or correcting `allocated` to `fresh_allocation`.
///
/// Entitlement is always evaluated against current rules: an existing row whose allocation
/// differs is rewritten in place. `used` and `carried_over` are never touched here.
pub fn get_or_repair(
    tx: &mut dyn LeaveTransaction,
    key: &BalanceKey,
    fresh_allocation: u32,
) -> Result<LeaveBalance, LeaveServiceError> {
    match tx.balance(key)? {
        None => {
            let balance = LeaveBalance::open(key, fresh_allocation);
            debug!(balance_id = %balance.id, allocated = fresh_allocation, "opening leave balance");
            tx.put_balance(balance.clone());
            Ok(balance)
        }
        Some(mut balance) if balance.allocated != fresh_allocation => {
            debug!(
                balance_id = %balance.id,
                previous = balance.allocated,
                allocated = fresh_allocation,
                "correcting stale allocation"
            );
            balance.allocated = fresh_allocation;
            tx.put_balance(balance.clone());
            Ok(balance)
        }
        Some(balance) => Ok(balance),
    }
}

/// Consume `days` from the balance, refusing to take `available` below zero.
pub fn debit(
    tx: &mut dyn LeaveTransaction,
    key: &BalanceKey,
    days: u32,
) -> Result<LeaveBalance, LeaveServiceError> {
    let mut balance = tx
        .balance(key)?
        .ok_or_else(|| LeaveServiceError::balance_not_found(key.document_id()))?;

    let available = balance.available();
    if available < i64::from(days) {
        return Err(LeaveServiceError::InsufficientBalance {
            balance_id: balance.id,
            available,
            requested: days,
        });
    }

    balance.used += days;
    tx.put_balance(balance.clone());
    Ok(balance)
}

/// Upsert entitlement figures with merge semantics.
///
/// `allocated` is set, `carried_over` is set only when provided, `used` is preserved. Setting
/// rather than adding makes reruns harmless. An upsert that would leave `available` negative
/// is refused.
pub fn seed_or_credit(
    tx: &mut dyn LeaveTransaction,
    key: &BalanceKey,
    allocated: u32,
    carried_over: Option<u32>,
) -> Result<LeaveBalance, LeaveServiceError> {
    let mut balance = tx
        .balance(key)?
        .unwrap_or_else(|| LeaveBalance::open(key, allocated));

    balance.allocated = allocated;
    if let Some(days) = carried_over {
        balance.carried_over = days;
    }

    let available = balance.available();
    if available < 0 {
        return Err(LeaveServiceError::Overdrawn {
            balance_id: balance.id,
            available,
        });
    }

    tx.put_balance(balance.clone());
    Ok(balance)
}
