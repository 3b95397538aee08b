use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, PaymentTransaction, TxRef},
    traits::PaymentLedgerError,
};

/// Inserts a new `Pending` ledger row using the given connection. This is not atomic on its own. Embed the call
/// inside a transaction and pass `&mut *tx` as the connection argument if other writes must ride along.
pub async fn insert_transaction(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransaction, PaymentLedgerError> {
    let tx_ref = transaction.tx_ref.clone();
    let record = sqlx::query_as(
        r#"
            INSERT INTO payment_transactions (tx_ref, cart_id, amount, currency, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(transaction.tx_ref)
    .bind(transaction.cart_id)
    .bind(transaction.amount)
    .bind(transaction.currency)
    .bind(transaction.user_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            PaymentLedgerError::TransactionAlreadyExists(tx_ref)
        },
        _ => PaymentLedgerError::from(e),
    })?;
    Ok(record)
}

/// Returns the ledger row for the given reference. References are unique, so this is at most one row.
pub async fn fetch_transaction_by_ref(
    tx_ref: &TxRef,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM payment_transactions WHERE tx_ref = $1")
        .bind(tx_ref.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// Flips the row to `Completed`, conditional on it still being `Pending`. Returns whether a row was changed.
/// A `false` result means the row was already terminal (or absent); the caller re-reads to find out which.
pub(crate) async fn mark_completed(tx_ref: &TxRef, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payment_transactions SET status = 'Completed', updated_at = CURRENT_TIMESTAMP \
         WHERE tx_ref = $1 AND status = 'Pending'",
    )
    .bind(tx_ref.as_str())
    .execute(conn)
    .await?;
    let flipped = result.rows_affected() == 1;
    if flipped {
        debug!("🧾️ Transaction [{tx_ref}] moved from Pending to Completed");
    }
    Ok(flipped)
}

/// Flips the row to `Failed`, conditional on it still being `Pending`. Returns whether a row was changed.
pub(crate) async fn mark_failed(tx_ref: &TxRef, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payment_transactions SET status = 'Failed', updated_at = CURRENT_TIMESTAMP \
         WHERE tx_ref = $1 AND status = 'Pending'",
    )
    .bind(tx_ref.as_str())
    .execute(conn)
    .await?;
    let flipped = result.rows_affected() == 1;
    if flipped {
        debug!("🧾️ Transaction [{tx_ref}] moved from Pending to Failed");
    }
    Ok(flipped)
}
