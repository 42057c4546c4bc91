//! Stateless pub-sub plumbing for reconciliation events.
//!
//! An [`EventHandler`] owns one mpsc channel and one async handler function. Producers are cheap
//! clones of the sending half. The handler task has no access to engine state; everything it needs
//! must travel inside the event itself.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::{
    sync::mpsc,
    time::{sleep, Duration},
};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    inbox: mpsc::Receiver<E>,
    tx: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (tx, inbox) = mpsc::channel(buffer_size);
        Self { inbox, tx, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.tx.clone())
    }

    /// Runs until every producer has been dropped, then waits for in-flight handler invocations to
    /// finish before returning.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event handler running");
        // The handler holds its own copy of the sender. Drop it so the recv loop ends as soon as
        // the last external producer goes away.
        drop(self.tx);
        let in_flight = Arc::new(AtomicI64::new(0));
        while let Some(event) = self.inbox.recv().await {
            trace!("📬️ Event received");
            let handler = Arc::clone(&self.handler);
            in_flight.fetch_add(1, Ordering::SeqCst);
            let active = in_flight.clone();
            tokio::spawn(async move {
                (handler)(event).await;
                active.fetch_sub(1, Ordering::SeqCst);
                trace!("📬️ Event handled");
            });
        }
        while in_flight.load(Ordering::SeqCst) > 0 {
            debug!("📬️ Draining in-flight event jobs");
            sleep(Duration::from_millis(250)).await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    tx: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(tx: mpsc::Sender<E>) -> Self {
        Self { tx }
    }

    /// Fire-and-forget. A closed channel is logged and otherwise ignored, so publishing can never
    /// fail a reconciliation that has already committed.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.tx.send(event).await {
            error!("📬️ Failed to publish event: {e}");
        }
    }
}
