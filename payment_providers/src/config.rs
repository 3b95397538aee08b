use log::*;
use spg_common::Secret;

pub const DEFAULT_FLUTTERWAVE_API_BASE: &str = "https://api.flutterwave.com/v3";
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
/// Maximum age of a signed webhook event before it is considered a replay, in seconds.
pub const DEFAULT_SIGNATURE_TOLERANCE: i64 = 300;

#[derive(Debug, Clone, Default)]
pub struct FlutterwaveConfig {
    pub api_base: String,
    pub secret_key: Secret<String>,
    /// Where the hosted payment page sends the shopper after the payment attempt. The provider appends
    /// `status`, `tx_ref` and `transaction_id` query parameters.
    pub redirect_url: String,
}

impl FlutterwaveConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_base = std::env::var("SPG_FLUTTERWAVE_API_BASE").unwrap_or_else(|_| {
            debug!("SPG_FLUTTERWAVE_API_BASE not set, using {DEFAULT_FLUTTERWAVE_API_BASE}");
            DEFAULT_FLUTTERWAVE_API_BASE.to_string()
        });
        let secret_key = Secret::new(std::env::var("SPG_FLUTTERWAVE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("SPG_FLUTTERWAVE_SECRET_KEY not set, using a dummy value. Payment initiation will not work.");
            "FLWSECK_TEST-00000000000000".to_string()
        }));
        let redirect_url = std::env::var("SPG_FLUTTERWAVE_REDIRECT_URL")
            .unwrap_or_else(|_| format!("{}payment-status/", frontend_url()));
        Self { api_base, secret_key, redirect_url }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub api_base: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// The `{CHECKOUT_SESSION_ID}` placeholder is substituted by the provider, not by us.
    pub success_url: String,
    pub cancel_url: String,
    pub signature_tolerance: i64,
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_base = std::env::var("SPG_STRIPE_API_BASE").unwrap_or_else(|_| {
            debug!("SPG_STRIPE_API_BASE not set, using {DEFAULT_STRIPE_API_BASE}");
            DEFAULT_STRIPE_API_BASE.to_string()
        });
        let secret_key = Secret::new(std::env::var("SPG_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("SPG_STRIPE_SECRET_KEY not set, using a dummy value. Checkout sessions cannot be created.");
            "sk_test_00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("SPG_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("SPG_STRIPE_WEBHOOK_SECRET not set, using a dummy value. Incoming webhooks will be rejected.");
            "whsec_00000000000000".to_string()
        }));
        let success_url = std::env::var("SPG_STRIPE_SUCCESS_URL")
            .unwrap_or_else(|_| format!("{}payment-status?session_id={{CHECKOUT_SESSION_ID}}", frontend_url()));
        let cancel_url = std::env::var("SPG_STRIPE_CANCEL_URL")
            .unwrap_or_else(|_| format!("{}payment-status?canceled=true", frontend_url()));
        let signature_tolerance = std::env::var("SPG_STRIPE_SIG_TOLERANCE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("Invalid value for SPG_STRIPE_SIG_TOLERANCE: {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_SIGNATURE_TOLERANCE);
        Self { api_base, secret_key, webhook_secret, success_url, cancel_url, signature_tolerance }
    }
}

/// The base URL of the storefront web app, with a trailing slash. Shoppers land back here after visiting a
/// provider's hosted payment page.
pub fn frontend_url() -> String {
    let mut url = std::env::var("SPG_FRONTEND_URL").unwrap_or_else(|_| {
        warn!("SPG_FRONTEND_URL not set, using http://localhost:3000/ as the storefront base url");
        "http://localhost:3000/".to_string()
    });
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
