use payment_providers::Provider;
use serde::{Deserialize, Serialize};

//--------------------------------------      Initiation       -------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentRequest {
    pub cart_code: String,
    /// Which provider to open the session with. Falls back to the configured default when omitted.
    #[serde(default)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentResponse {
    /// The reference the provider's later notifications will carry.
    pub session_reference: String,
    /// The hosted payment page the shopper must be sent to.
    pub redirect_url: String,
}

//--------------------------------------  Provider parameters  -------------------------------------------------------

/// Query parameters appended by the redirect-style provider when it sends the shopper back. These are
/// client-supplied and untrusted; only `transaction_id` is used, and only to ask the provider for its own record.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    pub status: String,
    pub tx_ref: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuccessParams {
    pub session_id: String,
}

//--------------------------------------    PaymentResponse    -------------------------------------------------------

/// The `{message, subMessage}` pair every payment-flow endpoint answers with, so a front end can render the
/// outcome without further lookups. The wire names are what the storefront already expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub message: String,
    #[serde(rename = "subMessage")]
    pub sub_message: String,
}

impl PaymentResponse {
    pub fn new<S1: Into<String>, S2: Into<String>>(message: S1, sub_message: S2) -> Self {
        Self { message: message.into(), sub_message: sub_message.into() }
    }

    pub fn payment_successful() -> Self {
        Self::new("Payment successful!", "You have successfully made payment")
    }

    pub fn verification_failed() -> Self {
        Self::new("Payment verification failed.", "Your payment verification failed")
    }

    pub fn not_successful() -> Self {
        Self::new("Payment was not successful.", "The provider reported the payment attempt as unsuccessful")
    }

    pub fn not_completed() -> Self {
        Self::new("Payment not completed", "Your payment was not completed successfully")
    }

    pub fn transaction_not_found() -> Self {
        Self::new("Transaction not found", "We could not find your transaction record")
    }

    pub fn canceled() -> Self {
        Self::new("Payment was canceled", "Your payment process was canceled")
    }
}
