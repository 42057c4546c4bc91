use std::{future::Future, pin::Pin};

use dotenvy::dotenv;
use log::info;
use shop_payment_engine::events::EventHooks;
use shop_payment_server::{cli::handle_command_line_args, config::ServerConfig, server::run_server};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    handle_command_line_args();
    let config = ServerConfig::from_env_or_default();

    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        Box::pin(async move {
            info!("🪝️ Order {} has been paid. {} settled", ev.order.order_number, ev.order.total_amount);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_refund_succeeded(|ev| {
        Box::pin(async move {
            info!("🪝️ Order {} has been refunded. {} returned", ev.order.order_number, ev.order.total_amount);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });

    info!("🚀️ Starting server on {}:{}", config.host, config.port);
    match run_server(config, hooks).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
