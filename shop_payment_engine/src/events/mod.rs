//! Post-commit event broadcasting.
//!
//! Reconciliation emits an event after, and only after, the corresponding database transition has
//! committed. Delivery is fire-and-forget: a slow or failing subscriber can never roll back or
//! delay an acknowledgement to a gateway.

mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderPaidEvent, RefundSucceededEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
