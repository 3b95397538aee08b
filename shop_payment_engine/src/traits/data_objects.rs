use crate::db_types::PaymentTransaction;

/// The result of asking the ledger to settle a transaction.
#[derive(Debug, Clone)]
pub enum SettlementStatus {
    /// The conditional update flipped the row to `Completed` and marked its cart paid.
    Settled(PaymentTransaction),
    /// The row was already in a terminal state, so nothing was written. The enclosed row carries the status that
    /// was already in place; callers that care must check it, since a racing failure verdict also lands here.
    AlreadySettled(PaymentTransaction),
}
