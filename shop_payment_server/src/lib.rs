//! # SPG server
//! This module hosts the server code for the shop payment gateway. It is responsible for:
//! Listening for incoming payment and refund notifications from Alipay and WeChat.
//! Verifying each notification's signature and extracting the order information.
//! Reconciling the notification against the orders database and answering the gateway with the
//! exact acknowledgement its protocol requires.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/notify/alipay`: Alipay's asynchronous payment notification route.
//! * `/notify/wechat`: WeChat's asynchronous payment notification route.
//! * `/notify/wechat/refund`: WeChat's asynchronous refund-result notification route.
//! * `/return/alipay`: The browser-facing redirect after an Alipay payment. Display only.

pub mod ack;
pub mod cli;
pub mod config;
pub mod errors;

pub mod routes;
pub mod server;
pub mod verifier;

#[cfg(test)]
mod endpoint_tests;
