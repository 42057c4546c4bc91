//! Shop Payment Engine
//!
//! The engine that keeps the shop's orders and the payment gateways' view of them in agreement.
//! Alipay and WeChat deliver asynchronous server-to-server notifications for payments and refunds,
//! and they deliver them as often as they like: duplicated, concurrent, and in any order. This
//! library turns each verified notification into at most one durable state transition on the
//! order it names.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly. Instead, use the public API provided by
//!    the engine. The exception is the data types stored in the database. These are defined in the
//!    `db_types` module and are public.
//! 2. The reconciliation API ([`ReconcileApi`]). This is the public-facing functionality of the
//!    engine. A storage backend implements [`traits::OrderStore`] to plug in underneath it, and a
//!    transport layer implements [`traits::NotificationVerifier`] to feed it.
//! 3. Events ([`mod@events`]). When an order is paid or refunded, the engine emits an event after
//!    the transition commits. A simple actor framework is used so that you can hook into these
//!    events and perform custom actions without ever delaying a gateway acknowledgement.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod notifications;
mod spe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteOrderStore;
pub use spe_api::reconcile_api::{PaymentOutcome, ReconcileApi, RefundOutcome};
