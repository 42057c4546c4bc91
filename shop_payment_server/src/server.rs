use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use shop_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    ReconcileApi,
    SqliteOrderStore,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{alipay_notify, alipay_return, health, wechat_notify, wechat_refund_notify},
    verifier::FormNotificationVerifier,
};

const EVENT_BUFFER_SIZE: usize = 100;

pub async fn run_server(config: ServerConfig, hooks: EventHooks) -> Result<(), ServerError> {
    let db = SqliteOrderStore::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::StartupError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::RuntimeError(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteOrderStore,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let api = ReconcileApi::new(db.clone(), producers.clone());
        let verifier = FormNotificationVerifier::new(&config.notify);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(verifier))
            .service(health)
            .service(
                web::resource("/notify/alipay")
                    .route(web::post().to(alipay_notify::<SqliteOrderStore, FormNotificationVerifier>)),
            )
            .service(
                web::resource("/notify/wechat")
                    .route(web::post().to(wechat_notify::<SqliteOrderStore, FormNotificationVerifier>)),
            )
            .service(
                web::resource("/notify/wechat/refund")
                    .route(web::post().to(wechat_refund_notify::<SqliteOrderStore, FormNotificationVerifier>)),
            )
            .service(web::resource("/return/alipay").route(web::get().to(alipay_return::<FormNotificationVerifier>)))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
