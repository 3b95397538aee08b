use std::fmt::Debug;

use log::*;
use spg_common::Cents;

use crate::{
    db_types::{CartItem, NewTransaction, PaymentTransaction, TransactionStatus, TxRef, DEFAULT_CURRENCY},
    spe_api::checkout_objects::{
        CheckoutQuote,
        PaymentConfirmation,
        ProviderVerdict,
        VerificationFailure,
        VerificationOutcome,
        CHECKOUT_TAX,
    },
    traits::{PaymentLedgerDatabase, PaymentLedgerError, SettlementStatus},
};

/// `PaymentFlowApi` is the primary API for the payment flow: pricing a checkout, recording the pending attempt
/// once a remote session is open, and reconciling the provider's verdict against the ledger.
pub struct PaymentFlowApi<B> {
    db: B,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> PaymentFlowApi<B>
where B: PaymentLedgerDatabase
{
    /// Prices the given cart for checkout.
    ///
    /// Loads the shopper and the cart, refuses carts that are already paid or empty, and sums the line items
    /// plus the flat [`CHECKOUT_TAX`] surcharge. The quoted amount is what the provider must eventually report
    /// back, to the cent, for the payment to settle.
    pub async fn prepare_checkout(&self, cart_code: &str, user_id: i64) -> Result<CheckoutQuote, PaymentLedgerError> {
        let user =
            self.db.fetch_user_by_id(user_id).await?.ok_or(PaymentLedgerError::UserNotFound(user_id))?;
        let cart = self
            .db
            .fetch_cart_by_code(cart_code, user_id)
            .await?
            .ok_or_else(|| PaymentLedgerError::CartNotFound(cart_code.to_string()))?;
        if cart.paid {
            return Err(PaymentLedgerError::CartAlreadyPaid(cart.cart_code));
        }
        let items = self.db.fetch_cart_items(cart.id).await?;
        if items.is_empty() {
            return Err(PaymentLedgerError::CartEmpty(cart.cart_code));
        }
        let subtotal = items.iter().map(CartItem::line_total).sum::<Cents>();
        let amount = subtotal + CHECKOUT_TAX;
        debug!(
            "🔄️🛒️ Cart [{}] quoted at {amount} {DEFAULT_CURRENCY} ({} items plus {CHECKOUT_TAX} tax) for user \
             #{user_id}",
            cart.cart_code,
            items.len()
        );
        Ok(CheckoutQuote { user, cart, amount, currency: DEFAULT_CURRENCY.to_string() })
    }

    /// Records a payment attempt as a `Pending` ledger row.
    ///
    /// Call this only after the remote session was opened successfully. A failed remote call must leave no
    /// ledger row, so that abandoned rows always correspond to sessions a shopper actually saw. Each attempt
    /// gets its own fresh reference; earlier pending attempts for the same cart remain as abandoned history.
    pub async fn record_pending_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<PaymentTransaction, PaymentLedgerError> {
        let record = self.db.insert_transaction(transaction).await?;
        debug!("🔄️💳️ Transaction [{}] is now Pending for cart #{}", record.tx_ref, record.cart_id);
        Ok(record)
    }

    /// Reconciles a provider verdict against the ledger. This is the state machine of the whole gateway:
    ///
    /// | Row status \ verdict | Successful, matching    | Successful, mismatch | Incomplete | Declined |
    /// |----------------------|-------------------------|----------------------|------------|----------|
    /// | Pending              | Settled                 | Failed               | Incomplete | Failed   |
    /// | Completed            | AlreadySettled          | AlreadySettled       | AlreadySettled | AlreadySettled |
    /// | Failed               | Failed (AlreadyFailed)  | Failed               | Failed     | Failed   |
    ///
    /// "Matching" means the provider's amount equals the ledger amount exactly (minor units) and the currency
    /// matches case-insensitively. Terminal rows are never written to again, whatever the verdict says, so
    /// applying the same confirmation twice settles once and acknowledges the second time.
    ///
    /// An unknown reference is an error ([`PaymentLedgerError::TransactionNotFound`]); the caller decides whether
    /// that is a 404 (synchronous flows) or a logged acknowledgement (webhook redeliveries).
    pub async fn apply_verified_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerificationOutcome, PaymentLedgerError> {
        let tx_ref = &confirmation.tx_ref;
        let record = self
            .db
            .fetch_transaction_by_ref(tx_ref)
            .await?
            .ok_or_else(|| PaymentLedgerError::TransactionNotFound(tx_ref.clone()))?;
        match record.status {
            TransactionStatus::Completed => {
                debug!("🔄️✅️ Transaction [{tx_ref}] was already settled. Nothing to do");
                Ok(VerificationOutcome::AlreadySettled(record))
            },
            TransactionStatus::Failed => {
                debug!("🔄️❌️ Transaction [{tx_ref}] has already failed. The new verdict changes nothing");
                Ok(VerificationOutcome::Failed { transaction: record, reason: VerificationFailure::AlreadyFailed })
            },
            TransactionStatus::Pending => self.reconcile_pending(record, confirmation).await,
        }
    }

    async fn reconcile_pending(
        &self,
        record: PaymentTransaction,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerificationOutcome, PaymentLedgerError> {
        let tx_ref = record.tx_ref.clone();
        match confirmation.verdict {
            ProviderVerdict::Incomplete => {
                debug!("🔄️⏳️ Transaction [{tx_ref}] has no final verdict at the provider yet. Leaving it Pending");
                Ok(VerificationOutcome::Incomplete(record))
            },
            ProviderVerdict::Declined => {
                let failed = self.db.fail_transaction(&tx_ref, "the provider declined the payment").await?;
                Ok(VerificationOutcome::Failed { transaction: failed, reason: VerificationFailure::ProviderDeclined })
            },
            ProviderVerdict::Successful => {
                if let Some(reason) = verification_mismatch(&record, confirmation) {
                    warn!("🔄️❌️ Transaction [{tx_ref}] failed verification: {reason}");
                    let failed = self.db.fail_transaction(&tx_ref, &reason.to_string()).await?;
                    return Ok(VerificationOutcome::Failed { transaction: failed, reason });
                }
                match self.db.settle_transaction(&tx_ref).await? {
                    SettlementStatus::Settled(settled) => {
                        info!("🔄️✅️ Transaction [{tx_ref}] settled. Cart #{} is paid", settled.cart_id);
                        Ok(VerificationOutcome::Settled(settled))
                    },
                    // A concurrent event won the conditional update between our read and our write.
                    SettlementStatus::AlreadySettled(current) => match current.status {
                        TransactionStatus::Failed => Ok(VerificationOutcome::Failed {
                            transaction: current,
                            reason: VerificationFailure::AlreadyFailed,
                        }),
                        _ => Ok(VerificationOutcome::AlreadySettled(current)),
                    },
                }
            },
        }
    }

    /// Read access to a ledger row for display and audit.
    pub async fn transaction_by_ref(&self, tx_ref: &TxRef) -> Result<Option<PaymentTransaction>, PaymentLedgerError> {
        self.db.fetch_transaction_by_ref(tx_ref).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Compares the provider's verdict with the ledger row. Amounts must match to the cent; the currency comparison
/// tolerates case because one provider reports "USD" and the other "usd".
fn verification_mismatch(record: &PaymentTransaction, confirmation: &PaymentConfirmation) -> Option<VerificationFailure> {
    if confirmation.amount != record.amount {
        return Some(VerificationFailure::AmountMismatch { expected: record.amount, actual: confirmation.amount });
    }
    if !confirmation.currency.eq_ignore_ascii_case(&record.currency) {
        return Some(VerificationFailure::CurrencyMismatch {
            expected: record.currency.clone(),
            actual: confirmation.currency.clone(),
        });
    }
    None
}
