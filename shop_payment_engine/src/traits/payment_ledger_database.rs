use thiserror::Error;

use crate::{
    db_types::{NewTransaction, PaymentTransaction, TxRef},
    traits::{SettlementStatus, StorefrontAccess},
};

/// The ledger contract a database backend must fulfil for the shop payment gateway.
///
/// A ledger row is born `Pending` when a remote payment session opens, and moves exactly once, to `Completed` or
/// to `Failed`. Both transitions are expressed as conditional updates on the `Pending` status so that a redelivered
/// webhook, a shopper refreshing the callback page, or two racing notifications can never apply a side effect
/// twice or resurrect a terminal row.
#[allow(async_fn_in_trait)]
pub trait PaymentLedgerDatabase: Clone + StorefrontAccess {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Records a freshly initiated payment attempt as a `Pending` ledger row.
    ///
    /// The row is only written after the remote session was opened successfully, so a provider outage leaves no
    /// trace in the ledger. The cart is re-checked inside the same transaction; paying an already-paid cart is
    /// refused with [`PaymentLedgerError::CartAlreadyPaid`] even if the caller skipped the quote step.
    ///
    /// A duplicate reference returns [`PaymentLedgerError::TransactionAlreadyExists`].
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<PaymentTransaction, PaymentLedgerError>;

    /// Fetches the ledger row for the given reference, or `None` if no attempt with that reference exists.
    async fn fetch_transaction_by_ref(&self, tx_ref: &TxRef) -> Result<Option<PaymentTransaction>, PaymentLedgerError>;

    /// In a single atomic transaction,
    /// * flips the row from `Pending` to `Completed`, conditional on it still being `Pending`,
    /// * marks the referenced cart as paid.
    ///
    /// If the row was already terminal, nothing is written and
    /// [`SettlementStatus::AlreadySettled`] is returned with the row as it stands.
    async fn settle_transaction(&self, tx_ref: &TxRef) -> Result<SettlementStatus, PaymentLedgerError>;

    /// Flips the row from `Pending` to `Failed`, conditional on it still being `Pending`. Terminal rows are left
    /// untouched. Returns the row as it stands after the call. The reason is recorded in the logs only; the
    /// ledger row itself does not store it.
    async fn fail_transaction(&self, tx_ref: &TxRef, reason: &str) -> Result<PaymentTransaction, PaymentLedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentLedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentLedgerError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Cart {0} does not exist")]
    CartNotFound(String),
    #[error("Cart {0} has already been paid for")]
    CartAlreadyPaid(String),
    #[error("Cart {0} is empty, so there is nothing to pay for")]
    CartEmpty(String),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("No transaction exists with reference {0}")]
    TransactionNotFound(TxRef),
    #[error("A transaction with reference {0} already exists")]
    TransactionAlreadyExists(TxRef),
}

impl From<sqlx::Error> for PaymentLedgerError {
    fn from(e: sqlx::Error) -> Self {
        PaymentLedgerError::DatabaseError(e.to_string())
    }
}
