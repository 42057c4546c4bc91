use crate::db_types::Order;

/// Fired when an order transitions from `Unpaid` to `Paid`. Exactly one of these is emitted per
/// order, no matter how many times the gateway delivers the notification.
#[derive(Debug, Clone)]
pub struct OrderPaidEvent {
    pub order: Order,
}

/// Fired when an order's refund status first reaches `Success`.
#[derive(Debug, Clone)]
pub struct RefundSucceededEvent {
    pub order: Order,
}
