use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, PaymentSettlement, PaymentStatus},
    events::{EventProducers, OrderPaidEvent, RefundSucceededEvent},
    notifications::{PaymentNotification, RefundNotification, RefundResult, TradeStatus},
    traits::{OrderStore, ReconcileError},
};

/// What a payment notification did to the order, once reconciliation has run.
///
/// Every variant is a success from the gateway's point of view. Conditions that must make the
/// gateway retry (unknown order, amount mismatch, storage failure) are [`ReconcileError`]s instead.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// The trade status does not represent settled funds. Nothing was looked up or written.
    Ignored { status: TradeStatus },
    /// The order was already paid. Duplicate delivery; no state change, no event.
    AlreadyPaid(Order),
    /// This notification moved the order to `Paid`. Exactly one delivery per order gets this.
    NewlyPaid(Order),
}

/// What a refund notification did to the order.
#[derive(Debug, Clone)]
pub enum RefundOutcome {
    /// The refund result was recorded for the first time.
    Recorded(Order),
    /// The refund was already in this terminal state. Duplicate delivery; no event.
    AlreadyRecorded(Order),
    /// The gateway reported the refund failed; the failure code was recorded.
    FailureRecorded(Order),
}

/// `ReconcileApi` applies verified gateway notifications to the order store, exactly once each.
///
/// It holds no locks. All its concurrency guarantees come from the store's conditional updates:
/// when two deliveries race, both run the same sequence of reads and conditional writes, and the
/// store lets exactly one write through. The loser is folded into the duplicate-delivery outcome
/// rather than an error, because from the gateway's side both deliveries were handled correctly.
///
/// Events are published only after the store confirms the transition, and publishing is
/// best-effort. The result returned to the caller never depends on event delivery.
pub struct ReconcileApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconcileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconcileApi")
    }
}

impl<B> ReconcileApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReconcileApi<B>
where B: OrderStore
{
    /// Reconcile a verified payment notification against the order it names.
    ///
    /// Non-settlement statuses are acknowledged and ignored without touching the store. For
    /// settlement statuses, the order must exist, carry the same total as the notification, and
    /// not be closed. The `Unpaid` to `Paid` transition itself is a conditional write; losing that
    /// race is reported as [`PaymentOutcome::AlreadyPaid`], the same as an ordinary duplicate.
    pub async fn reconcile_payment(
        &self,
        notification: PaymentNotification,
    ) -> Result<PaymentOutcome, ReconcileError> {
        let number = notification.order_number.clone();
        if !notification.trade_status.is_settled() {
            debug!(
                "🔄️💳️ {} notification for order {number} has status {}. No funds have settled, so it is being \
                 ignored",
                notification.method, notification.trade_status
            );
            return Ok(PaymentOutcome::Ignored { status: notification.trade_status });
        }
        let order = self
            .db
            .fetch_order_by_number(&number)
            .await?
            .ok_or_else(|| ReconcileError::OrderNotFound(number.clone()))?;
        if order.total_amount != notification.amount {
            warn!(
                "🔄️💳️ Order {number} has total {}, but the gateway reported {}. Refusing to reconcile",
                order.total_amount, notification.amount
            );
            return Err(ReconcileError::AmountMismatch {
                order: number,
                expected: order.total_amount,
                actual: notification.amount,
            });
        }
        if order.payment_status == PaymentStatus::Paid {
            debug!("🔄️💳️ Order {number} is already paid. Acknowledging the duplicate and moving on");
            return Ok(PaymentOutcome::AlreadyPaid(order));
        }
        if order.closed {
            info!("🔄️💳️ Order {number} is closed and will not accept payment [{}]", notification.reference);
            return Err(ReconcileError::OrderClosed(number));
        }
        let settlement = PaymentSettlement {
            paid_at: notification.paid_at,
            method: notification.method,
            reference: notification.reference.clone(),
        };
        match self.db.try_mark_paid(&number, &settlement).await? {
            Some(updated) => {
                info!(
                    "🔄️💳️ Order {number} paid via {} [{}]. {} received",
                    settlement.method, settlement.reference, updated.total_amount
                );
                self.call_order_paid_hook(&updated).await;
                Ok(PaymentOutcome::NewlyPaid(updated))
            },
            None => {
                // The conditional write did not match, so the row changed under us between the
                // read above and the write. Re-fetch once to report what actually happened.
                debug!("🔄️💳️ Order {number} changed mid-reconciliation. Re-fetching to classify the outcome");
                match self.db.fetch_order_by_number(&number).await? {
                    Some(order) if order.payment_status == PaymentStatus::Paid => {
                        Ok(PaymentOutcome::AlreadyPaid(order))
                    },
                    Some(_) => Err(ReconcileError::OrderClosed(number)),
                    None => Err(ReconcileError::OrderNotFound(number)),
                }
            },
        }
    }

    /// Reconcile a verified refund-result notification.
    ///
    /// A refund notification for an unknown order is a hard fault rather than a retryable race: no
    /// refund can legitimately exist for an order this engine never saw.
    pub async fn reconcile_refund(&self, notification: RefundNotification) -> Result<RefundOutcome, ReconcileError> {
        let number = notification.order_number.clone();
        if self.db.fetch_order_by_number(&number).await?.is_none() {
            warn!("🔄️↩️ Refund notification for order {number}, but no such order exists");
            return Err(ReconcileError::RefundOrderMissing(number));
        }
        match notification.result {
            RefundResult::Success => match self.db.try_record_refund_success(&number).await? {
                Some(updated) => {
                    info!("🔄️↩️ Refund for order {number} succeeded. {} returned", updated.total_amount);
                    self.call_refund_succeeded_hook(&updated).await;
                    Ok(RefundOutcome::Recorded(updated))
                },
                None => {
                    debug!("🔄️↩️ Refund for order {number} was already recorded. Acknowledging the duplicate");
                    match self.db.fetch_order_by_number(&number).await? {
                        Some(order) => Ok(RefundOutcome::AlreadyRecorded(order)),
                        None => Err(ReconcileError::RefundOrderMissing(number)),
                    }
                },
            },
            RefundResult::Failed { code } => {
                let updated = self
                    .db
                    .record_refund_failure(&number, &code)
                    .await?
                    .ok_or_else(|| ReconcileError::RefundOrderMissing(number.clone()))?;
                warn!("🔄️↩️ Refund for order {number} failed with gateway status '{code}'");
                Ok(RefundOutcome::FailureRecorded(updated))
            },
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid {
            debug!("🔄️💳️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent { order: order.clone() };
            emitter.publish_event(event).await;
        }
    }

    async fn call_refund_succeeded_hook(&self, order: &Order) {
        for emitter in &self.producers.refund_succeeded {
            debug!("🔄️↩️ Notifying refund succeeded hook subscribers");
            let event = RefundSucceededEvent { order: order.clone() };
            emitter.publish_event(event).await;
        }
    }
}

impl<B> ReconcileApi<B>
where B: OrderStore
{
    /// Access to the underlying store, for callers that manage orders directly.
    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
