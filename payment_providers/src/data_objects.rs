use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use spg_common::Cents;

use crate::ProviderApiError;

//--------------------------------------       Provider       --------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Flutterwave,
    Stripe,
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Flutterwave => write!(f, "flutterwave"),
            Provider::Stripe => write!(f, "stripe"),
        }
    }
}

impl FromStr for Provider {
    type Err = ProviderApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flutterwave" => Ok(Provider::Flutterwave),
            "stripe" => Ok(Provider::Stripe),
            other => Err(ProviderApiError::UnsupportedProvider(other.to_string())),
        }
    }
}

//--------------------------------------    Session objects    -------------------------------------------------------

/// Everything a provider needs to open a remote payment session for one checkout attempt.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// The ledger reference for this attempt. Providers echo it back in their notifications.
    pub tx_ref: String,
    pub amount: Cents,
    pub currency: String,
    pub cart_code: String,
    pub customer: CheckoutCustomer,
}

#[derive(Debug, Clone)]
pub struct CheckoutCustomer {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: String,
}

/// A freshly opened remote payment session. `reference` is the string later notifications will carry: the `tx_ref`
/// itself for redirect-style providers, or the provider's own session id for hosted-checkout providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub reference: String,
    pub redirect_url: String,
}

//--------------------------------------   Verification data   -------------------------------------------------------

/// The provider's verdict on a payment, in its own authoritative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderPaymentStatus {
    /// The provider has collected the funds.
    Successful,
    /// The session exists but the shopper has not (yet) paid. Not a failure.
    Incomplete,
    /// The provider reports the payment as failed or cancelled.
    Declined,
}

/// A payment record fetched from (or pushed by) a provider over an authenticated channel. Callback query strings
/// never produce one of these; only a server-to-server lookup or a signature-checked webhook does.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub tx_ref: String,
    pub amount: Cents,
    pub currency: String,
    pub status: ProviderPaymentStatus,
}

/// A webhook notification whose signature has already been verified.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// A checkout session finished. Carries the provider's authoritative payment record.
    CheckoutCompleted(VerifiedPayment),
    /// Any event type this system does not act on. Acknowledged and dropped.
    Ignored(String),
}
