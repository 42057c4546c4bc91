use thiserror::Error;
use spg_common::Cents;

use crate::db_types::{NewOrder, Order, OrderNumber, PaymentSettlement};

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Refund notification for order {0}, but that order does not exist")]
    RefundOrderMissing(OrderNumber),
    #[error("Order {0} is closed and cannot accept a payment")]
    OrderClosed(OrderNumber),
    #[error("Amount mismatch on order {order}. Expected {expected}, but the gateway reported {actual}")]
    AmountMismatch { order: OrderNumber, expected: Cents, actual: Cents },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for ReconcileError {
    fn from(e: sqlx::Error) -> Self {
        ReconcileError::DatabaseError(e.to_string())
    }
}

/// The persistence contract for orders.
///
/// The conditional transitions (`try_mark_paid`, `try_record_refund_success`, `close_order`) are
/// the concurrency guard for the whole engine: each one must be a single atomic compare-and-set
/// against the current row state, returning the updated row when the transition happened and
/// `None` when the guard did not match. Callers never hold locks around these calls, so two
/// concurrent deliveries of the same notification must resolve to exactly one `Some`.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// The database URL the store is connected to. Used in log messages.
    fn url(&self) -> &str;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError>;

    /// Inserts a new order. If an order with the same number already exists, the existing row is
    /// returned instead and the boolean is `false`.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), ReconcileError>;

    /// Marks the order as paid, if and only if it is currently `Unpaid` and not closed.
    async fn try_mark_paid(
        &self,
        number: &OrderNumber,
        settlement: &PaymentSettlement,
    ) -> Result<Option<Order>, ReconcileError>;

    /// Moves the order's refund status to `Success`, if and only if it is not already `Success`.
    async fn try_record_refund_success(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError>;

    /// Records a failed refund attempt: sets the refund status to `Failed` and stores the raw
    /// gateway status under [`ExtraFields::REFUND_FAILED_CODE`](crate::db_types::ExtraFields).
    /// Unconditional. Returns `None` when the order does not exist.
    async fn record_refund_failure(&self, number: &OrderNumber, code: &str) -> Result<Option<Order>, ReconcileError>;

    /// Closes the order, if and only if it is still `Unpaid`. Paid orders cannot be closed.
    async fn close_order(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError>;

    /// Release any resources held by the store.
    async fn close(&mut self) -> Result<(), ReconcileError> {
        Ok(())
    }
}
