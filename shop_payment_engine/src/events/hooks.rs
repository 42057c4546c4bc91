use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderPaidEvent, RefundSucceededEvent};

/// The sending side of every configured event channel. Cloned into each reconciliation API
/// instance; an empty producer list means the event is silently dropped.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid: Vec<EventProducer<OrderPaidEvent>>,
    pub refund_succeeded: Vec<EventProducer<RefundSucceededEvent>>,
}

/// One optional [`EventHandler`] per event kind, built from the hooks the host supplied.
pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_refund_succeeded: Option<EventHandler<RefundSucceededEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_paid: hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f)),
            on_refund_succeeded: hooks.on_refund_succeeded.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            order_paid: self.on_order_paid.iter().map(EventHandler::subscribe).collect(),
            refund_succeeded: self.on_refund_succeeded.iter().map(EventHandler::subscribe).collect(),
        }
    }

    /// Spawns one long-running task per configured handler. Call [`EventHandlers::producers`]
    /// first; once the handlers are running, new subscriptions are not possible.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_refund_succeeded {
            tokio::spawn(handler.start_handler());
        }
    }
}

/// The closures a host application wants run when reconciliation events fire.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_refund_succeeded: Option<Handler<RefundSucceededEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_refund_succeeded<F>(&mut self, f: F) -> &mut Self
    where F: Fn(RefundSucceededEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_refund_succeeded = Some(Arc::new(f));
        self
    }
}
