//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every handler is generic over the ledger backend and the provider gateways, so the endpoint tests can run the
//! real routing and error mapping against mocks. Since each worker thread processes its requests sequentially,
//! all provider and database calls are awaited futures; nothing here blocks the worker.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use payment_providers::{
    CheckoutCustomer,
    PaymentGateways,
    PaymentSession,
    Provider,
    ProviderApiError,
    ProviderPaymentStatus,
    SessionRequest,
    VerifiedPayment,
    WebhookEvent,
};
use serde_json::json;
use shop_payment_engine::{
    db_types::{NewTransaction, TxRef},
    CheckoutQuote,
    PaymentConfirmation,
    PaymentFlowApi,
    PaymentLedgerDatabase,
    PaymentLedgerError,
    ProviderVerdict,
    VerificationOutcome,
};

use crate::{
    auth::AuthenticatedUser,
    config::ServerOptions,
    data_objects::{CallbackParams, InitiatePaymentRequest, InitiatePaymentResponse, PaymentResponse, SuccessParams},
    errors::ServerError,
};

/// The signature header the hosted-checkout provider attaches to webhook deliveries.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Initiate  ----------------------------------------------------
route!(initiate => Post "/initiate" impl PaymentLedgerDatabase, PaymentGateways);
/// Route handler for the payment initiation endpoint.
///
/// Prices the cart, opens a remote payment session with the chosen provider, and only then records the attempt
/// as a `Pending` ledger row, so a provider outage leaves no trace in the ledger. The response carries the
/// reference the provider's notifications will use and the hosted page to send the shopper to.
pub async fn initiate<B, G>(
    user: AuthenticatedUser,
    body: web::Json<InitiatePaymentRequest>,
    api: web::Data<PaymentFlowApi<B>>,
    gateways: web::Data<G>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedgerDatabase + 'static,
    G: PaymentGateways + 'static,
{
    let request = body.into_inner();
    let provider = request.provider.unwrap_or(options.default_provider);
    debug!("💻️ POST initiate payment for cart [{}] by user #{} via {provider}", request.cart_code, user.id);
    let quote = api.prepare_checkout(&request.cart_code, user.id).await?;
    let tx_ref = TxRef::random();
    let session = open_session(gateways.as_ref(), provider, &tx_ref, &quote).await?;
    let transaction = NewTransaction::new(tx_ref, quote.cart.id, quote.amount, user.id);
    api.record_pending_transaction(transaction).await?;
    info!("💻️ Payment session [{}] is open for cart [{}]", session.reference, quote.cart.cart_code);
    Ok(HttpResponse::Ok()
        .json(InitiatePaymentResponse { session_reference: session.reference, redirect_url: session.redirect_url }))
}

async fn open_session<G: PaymentGateways>(
    gateways: &G,
    provider: Provider,
    tx_ref: &TxRef,
    quote: &CheckoutQuote,
) -> Result<PaymentSession, ServerError> {
    let request = SessionRequest {
        tx_ref: tx_ref.to_string(),
        amount: quote.amount,
        currency: quote.currency.clone(),
        cart_code: quote.cart.cart_code.clone(),
        customer: CheckoutCustomer {
            id: quote.user.id,
            email: quote.user.email.clone(),
            name: quote.user.username.clone(),
            phone: quote.user.phone.clone(),
        },
    };
    let session = gateways.initiate_session(provider, &request).await.map_err(|e| {
        warn!("💻️ Could not open a {provider} session for [{tx_ref}]. {e}");
        e
    })?;
    Ok(session)
}

//----------------------------------------------  Callback  ----------------------------------------------------
route!(callback => Get "/callback" impl PaymentLedgerDatabase, PaymentGateways);
/// Route handler for the redirect-style provider's confirmation endpoint.
///
/// The query parameters come from the shopper's browser and are untrusted. A reported failure is answered
/// directly and mutates nothing; a reported success triggers a server-to-server verify call, and only the
/// provider's own record is reconciled against the ledger.
pub async fn callback<B, G>(
    query: web::Query<CallbackParams>,
    api: web::Data<PaymentFlowApi<B>>,
    gateways: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedgerDatabase + 'static,
    G: PaymentGateways + 'static,
{
    handle_callback(query.into_inner(), api.as_ref(), gateways.as_ref()).await
}

// The provider can also be configured to POST the confirmation. The parameters still travel in the query string.
route!(callback_notify => Post "/callback" impl PaymentLedgerDatabase, PaymentGateways);
pub async fn callback_notify<B, G>(
    query: web::Query<CallbackParams>,
    api: web::Data<PaymentFlowApi<B>>,
    gateways: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedgerDatabase + 'static,
    G: PaymentGateways + 'static,
{
    handle_callback(query.into_inner(), api.as_ref(), gateways.as_ref()).await
}

async fn handle_callback<B, G>(
    params: CallbackParams,
    api: &PaymentFlowApi<B>,
    gateways: &G,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedgerDatabase,
    G: PaymentGateways,
{
    debug!("💻️ Payment callback for [{}] with reported status '{}'", params.tx_ref, params.status);
    if params.status != "successful" {
        // An untrusted failure report. Nothing is verified and nothing is written; the row stays Pending.
        info!("💻️ Callback for [{}] reported status '{}'. No verification attempted", params.tx_ref, params.status);
        return Ok(HttpResponse::BadRequest().json(PaymentResponse::not_successful()));
    }
    let verified = gateways.verify_flutterwave_transaction(&params.transaction_id).await.map_err(|e| {
        warn!("💻️ Could not verify transaction {} with the provider. {e}", params.transaction_id);
        e
    })?;
    reconcile(verified, api).await
}

//----------------------------------------------   Success  ----------------------------------------------------
route!(success => Get "/success" impl PaymentLedgerDatabase, PaymentGateways);
/// Route handler for the hosted-checkout provider's success page hit.
///
/// The shopper lands here with only a session id. The session is retrieved from the provider and its
/// authoritative state is reconciled; a session the shopper has not actually paid for reports "not completed".
pub async fn success<B, G>(
    query: web::Query<SuccessParams>,
    api: web::Data<PaymentFlowApi<B>>,
    gateways: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedgerDatabase + 'static,
    G: PaymentGateways + 'static,
{
    let session_id = query.into_inner().session_id;
    debug!("💻️ Success-page hit for checkout session {session_id}");
    let verified = gateways.retrieve_stripe_session(&session_id).await.map_err(|e| {
        warn!("💻️ Could not retrieve checkout session {session_id}. {e}");
        e
    })?;
    reconcile(verified, api.as_ref()).await
}

//----------------------------------------------  Canceled  ----------------------------------------------------
#[get("/canceled")]
pub async fn canceled() -> impl Responder {
    debug!("💻️ The shopper canceled the hosted checkout");
    HttpResponse::BadRequest().json(PaymentResponse::canceled())
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(webhook => Post "/webhook" impl PaymentLedgerDatabase, PaymentGateways);
/// Route handler for the hosted-checkout provider's webhook endpoint.
///
/// The raw body is authenticated against the signature header before a single payload byte is interpreted; a
/// bad signature or a malformed payload is a 400. A well-formed event that references an unknown transaction is
/// logged and acknowledged with a 200 so the provider does not keep redelivering it, but a database failure is a
/// 500 because in that case a redelivery is exactly what we want.
pub async fn webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B>>,
    gateways: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedgerDatabase + 'static,
    G: PaymentGateways + 'static,
{
    trace!("🔔️ Received webhook request: {}", req.uri());
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ProviderApiError::SignatureInvalid("The signature header is missing".to_string()))?;
    let event = gateways.stripe_webhook_event(&body, signature)?;
    match event {
        WebhookEvent::Ignored(event_type) => {
            trace!("🔔️ Acknowledging webhook event of type {event_type} without action");
        },
        WebhookEvent::CheckoutCompleted(verified) => {
            let confirmation = confirmation_from_verified(verified);
            match api.apply_verified_payment(&confirmation).await {
                Ok(outcome) => log_webhook_outcome(&outcome),
                Err(PaymentLedgerError::TransactionNotFound(tx_ref)) => {
                    // Acknowledge anyway; a 4xx/5xx here would only trigger a redelivery storm.
                    warn!("🔔️ Webhook references unknown transaction [{tx_ref}]. Acknowledged without action");
                },
                Err(e) => {
                    error!("🔔️ Could not reconcile webhook event for [{}]. {e}", confirmation.tx_ref);
                    return Err(ServerError::BackendError(e.to_string()));
                },
            }
        },
    }
    Ok(HttpResponse::Ok().json(json!({ "status": "success" })))
}

fn log_webhook_outcome(outcome: &VerificationOutcome) {
    match outcome {
        VerificationOutcome::Settled(tx) => {
            info!("🔔️ Webhook settled transaction [{}]; cart #{} is paid", tx.tx_ref, tx.cart_id)
        },
        VerificationOutcome::AlreadySettled(tx) => {
            info!("🔔️ Webhook redelivery for settled transaction [{}]. Nothing to do", tx.tx_ref)
        },
        VerificationOutcome::Incomplete(tx) => {
            info!("🔔️ Webhook for [{}] carries no final verdict. Row stays Pending", tx.tx_ref)
        },
        VerificationOutcome::Failed { transaction, reason } => {
            warn!("🔔️ Webhook verification failed for [{}]: {reason}", transaction.tx_ref)
        },
    }
}

//----------------------------------------------  Shared flow  ----------------------------------------------------

/// Reconciles a provider's authoritative record against the ledger and renders the outcome for the shopper.
async fn reconcile<B: PaymentLedgerDatabase>(
    verified: VerifiedPayment,
    api: &PaymentFlowApi<B>,
) -> Result<HttpResponse, ServerError> {
    let confirmation = confirmation_from_verified(verified);
    let outcome = match api.apply_verified_payment(&confirmation).await {
        Ok(outcome) => outcome,
        Err(PaymentLedgerError::TransactionNotFound(tx_ref)) => {
            info!("💻️ The provider confirmed [{tx_ref}], but no such transaction exists in the ledger");
            return Ok(HttpResponse::NotFound().json(PaymentResponse::transaction_not_found()));
        },
        Err(e) => return Err(e.into()),
    };
    let response = match outcome {
        VerificationOutcome::Settled(_) | VerificationOutcome::AlreadySettled(_) => {
            HttpResponse::Ok().json(PaymentResponse::payment_successful())
        },
        VerificationOutcome::Incomplete(_) => HttpResponse::BadRequest().json(PaymentResponse::not_completed()),
        // A business-logic failure, not a server error. The transaction is Failed and the cart stays unpaid.
        VerificationOutcome::Failed { .. } => HttpResponse::Ok().json(PaymentResponse::verification_failed()),
    };
    Ok(response)
}

fn confirmation_from_verified(verified: VerifiedPayment) -> PaymentConfirmation {
    let verdict = match verified.status {
        ProviderPaymentStatus::Successful => ProviderVerdict::Successful,
        ProviderPaymentStatus::Incomplete => ProviderVerdict::Incomplete,
        ProviderPaymentStatus::Declined => ProviderVerdict::Declined,
    };
    PaymentConfirmation {
        tx_ref: TxRef::from(verified.tx_ref),
        amount: verified.amount,
        currency: verified.currency,
        verdict,
    }
}
