use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use spg_common::Cents;
use sqlx::{FromRow, Type};
use thiserror::Error;

/// The currency every checkout is quoted and settled in.
pub const DEFAULT_CURRENCY: &str = "USD";

//--------------------------------------        TxRef        ---------------------------------------------------------
/// The ledger reference for a single payment attempt.
///
/// A `TxRef` is minted once, at initiation, and handed to the remote provider, which echoes it back in its
/// notifications. It is the only value that correlates a provider notification with a ledger row, so it is
/// unguessable (128 random bits) and unique (enforced by the database).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TxRef(String);

impl TxRef {
    /// Mints a fresh reference: 32 lowercase hex characters.
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let s = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for TxRef {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for TxRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// The remote session is open and no authoritative verdict has arrived yet.
    Pending,
    /// The provider confirmed the payment and the cart has been marked paid. Terminal.
    Completed,
    /// The provider declined the payment, or verification found a discrepancy. Terminal.
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Completed => write!(f, "Completed"),
            TransactionStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid transaction status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for TransactionStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//-------------------------------------- PaymentTransaction  ---------------------------------------------------------
/// One row of the payment ledger. Exactly one cart per transaction; a cart may accumulate several rows over time
/// as the shopper abandons and retries checkout.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentTransaction {
    pub id: i64,
    pub tx_ref: TxRef,
    pub cart_id: i64,
    /// The amount quoted at initiation. Fixed for the lifetime of the row, never recomputed.
    pub amount: Cents,
    /// Uppercase ISO code, fixed at initiation.
    pub currency: String,
    pub status: TransactionStatus,
    /// The account that started the checkout. Audit and display only.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   NewTransaction    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub tx_ref: TxRef,
    pub cart_id: i64,
    pub amount: Cents,
    pub currency: String,
    pub user_id: i64,
}

impl NewTransaction {
    pub fn new(tx_ref: TxRef, cart_id: i64, amount: Cents, user_id: i64) -> Self {
        Self { tx_ref, cart_id, amount, currency: DEFAULT_CURRENCY.to_string(), user_id }
    }
}

//--------------------------------------        Cart          --------------------------------------------------------
/// A cart as the storefront stores it. The gateway only ever reads carts and flips `paid`; creating and editing
/// them belongs to the storefront.
#[derive(Debug, Clone, FromRow)]
pub struct Cart {
    pub id: i64,
    pub cart_code: String,
    pub user_id: i64,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      CartItem        --------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_name: String,
    pub quantity: i64,
    /// Price per unit at the time the item went into the cart.
    pub unit_price: Cents,
}

impl CartItem {
    pub fn line_total(&self) -> Cents {
        self.unit_price * self.quantity
    }
}

//--------------------------------------     UserProfile      --------------------------------------------------------
/// The shopper's profile as the account system stores it. Read-only to the gateway.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: String,
}
