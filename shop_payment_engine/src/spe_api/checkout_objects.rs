use std::fmt::Display;

use spg_common::Cents;

use crate::db_types::{Cart, PaymentTransaction, TxRef, UserProfile};

/// The flat surcharge added to every checkout, in addition to the cart item total.
pub const CHECKOUT_TAX: Cents = Cents::from_major(5);

//--------------------------------------    CheckoutQuote     --------------------------------------------------------
/// Everything a provider session needs, priced and validated: the shopper, the cart, and the total that the
/// eventual provider verdict must match to the cent.
#[derive(Debug, Clone)]
pub struct CheckoutQuote {
    pub user: UserProfile,
    pub cart: Cart,
    /// Item total plus [`CHECKOUT_TAX`].
    pub amount: Cents,
    pub currency: String,
}

//-------------------------------------- PaymentConfirmation  --------------------------------------------------------
/// A provider's verdict on one payment attempt. A confirmation is only ever built from an authenticated source:
/// a server-to-server verify call or a signature-checked webhook, never from redirect query parameters.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub tx_ref: TxRef,
    pub amount: Cents,
    pub currency: String,
    pub verdict: ProviderVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderVerdict {
    /// The provider has collected the funds.
    Successful,
    /// The session exists but has not been paid (yet). Not a failure; the shopper may still finish.
    Incomplete,
    /// The provider reports the payment as declined or cancelled.
    Declined,
}

//-------------------------------------- VerificationOutcome  --------------------------------------------------------
/// What reconciling a [`PaymentConfirmation`] against the ledger did.
#[derive(Debug, Clone)]
pub enum VerificationOutcome {
    /// The verdict matched the ledger row; the row is now `Completed` and the cart is paid.
    Settled(PaymentTransaction),
    /// The row was already `Completed`. Nothing was written; redelivered notifications land here.
    AlreadySettled(PaymentTransaction),
    /// The provider has no final verdict yet. The row stays `Pending`.
    Incomplete(PaymentTransaction),
    /// The row is `Failed`, either because this verdict failed it or because it already was.
    Failed { transaction: PaymentTransaction, reason: VerificationFailure },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    /// The provider collected a different amount than the ledger row expects.
    AmountMismatch { expected: Cents, actual: Cents },
    /// The provider settled in a different currency than the ledger row expects.
    CurrencyMismatch { expected: String, actual: String },
    /// The provider's authoritative record says the payment failed.
    ProviderDeclined,
    /// The row was already `Failed` when the verdict arrived.
    AlreadyFailed,
}

impl Display for VerificationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationFailure::AmountMismatch { expected, actual } => {
                write!(f, "amount mismatch: the ledger expects {expected}, the provider collected {actual}")
            },
            VerificationFailure::CurrencyMismatch { expected, actual } => {
                write!(f, "currency mismatch: the ledger expects {expected}, the provider settled in {actual}")
            },
            VerificationFailure::ProviderDeclined => write!(f, "the provider declined the payment"),
            VerificationFailure::AlreadyFailed => write!(f, "the transaction had already failed"),
        }
    }
}
