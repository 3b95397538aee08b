use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{carts, db_url, new_pool, transactions, users};
use crate::{
    db_types::{Cart, CartItem, NewTransaction, PaymentTransaction, TxRef, UserProfile},
    traits::{PaymentLedgerDatabase, PaymentLedgerError, SettlementStatus, StorefrontAccess},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StorefrontAccess for SqliteDatabase {
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<UserProfile>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_cart_by_code(&self, cart_code: &str, user_id: i64) -> Result<Option<Cart>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart_by_code(cart_code, user_id, &mut conn).await?;
        Ok(cart)
    }

    async fn fetch_cart_items(&self, cart_id: i64) -> Result<Vec<CartItem>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart_items(cart_id, &mut conn).await?;
        Ok(items)
    }
}

impl PaymentLedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<PaymentTransaction, PaymentLedgerError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_cart_by_id(transaction.cart_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentLedgerError::CartNotFound(transaction.cart_id.to_string()))?;
        if cart.paid {
            return Err(PaymentLedgerError::CartAlreadyPaid(cart.cart_code));
        }
        let record = transactions::insert_transaction(transaction, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Transaction [{}] of {} {} for cart #{} recorded with id {}",
            record.tx_ref, record.amount, record.currency, record.cart_id, record.id
        );
        Ok(record)
    }

    async fn fetch_transaction_by_ref(&self, tx_ref: &TxRef) -> Result<Option<PaymentTransaction>, PaymentLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let record = transactions::fetch_transaction_by_ref(tx_ref, &mut conn).await?;
        Ok(record)
    }

    async fn settle_transaction(&self, tx_ref: &TxRef) -> Result<SettlementStatus, PaymentLedgerError> {
        let mut tx = self.pool.begin().await?;
        let record = transactions::fetch_transaction_by_ref(tx_ref, &mut tx)
            .await?
            .ok_or_else(|| PaymentLedgerError::TransactionNotFound(tx_ref.clone()))?;
        let flipped = transactions::mark_completed(tx_ref, &mut tx).await?;
        if !flipped {
            // The fetch above ran inside this transaction, so the record already carries the terminal status
            // that blocked the update.
            tx.commit().await?;
            debug!("🗃️ Transaction [{tx_ref}] is already {}. No action to take", record.status);
            return Ok(SettlementStatus::AlreadySettled(record));
        }
        carts::mark_cart_paid(record.cart_id, &mut tx).await?;
        let settled = transactions::fetch_transaction_by_ref(tx_ref, &mut tx)
            .await?
            .ok_or_else(|| PaymentLedgerError::TransactionNotFound(tx_ref.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Transaction [{tx_ref}] settled and cart #{} marked as paid", settled.cart_id);
        Ok(SettlementStatus::Settled(settled))
    }

    async fn fail_transaction(&self, tx_ref: &TxRef, reason: &str) -> Result<PaymentTransaction, PaymentLedgerError> {
        let mut tx = self.pool.begin().await?;
        let flipped = transactions::mark_failed(tx_ref, &mut tx).await?;
        let record = transactions::fetch_transaction_by_ref(tx_ref, &mut tx)
            .await?
            .ok_or_else(|| PaymentLedgerError::TransactionNotFound(tx_ref.clone()))?;
        tx.commit().await?;
        if flipped {
            warn!("🗃️ Transaction [{tx_ref}] marked as failed. Reason: {reason}");
        } else {
            debug!("🗃️ Transaction [{tx_ref}] is already {}. Failure ({reason}) not applied", record.status);
        }
        Ok(record)
    }

    async fn close(&mut self) -> Result<(), PaymentLedgerError> {
        self.pool.close().await;
        Ok(())
    }
}
