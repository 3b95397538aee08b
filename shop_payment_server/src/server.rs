use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use payment_providers::GatewayAdapter;
use shop_payment_engine::{PaymentFlowApi, SqliteDatabase};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    routes::{canceled, health, CallbackNotifyRoute, CallbackRoute, InitiateRoute, SuccessRoute, WebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateways = GatewayAdapter::new(config.flutterwave.clone(), config.stripe.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, gateways)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateways: GatewayAdapter,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let api = PaymentFlowApi::new(db.clone());
        let payments_scope = web::scope("/payments")
            .service(InitiateRoute::<SqliteDatabase, GatewayAdapter>::new())
            .service(CallbackRoute::<SqliteDatabase, GatewayAdapter>::new())
            .service(CallbackNotifyRoute::<SqliteDatabase, GatewayAdapter>::new())
            .service(SuccessRoute::<SqliteDatabase, GatewayAdapter>::new())
            .service(canceled)
            .service(WebhookRoute::<SqliteDatabase, GatewayAdapter>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(gateways.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(payments_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
