use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{ExtraFields, NewOrder, Order, OrderNumber, PaymentSettlement},
    traits::ReconcileError,
};

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, bool), ReconcileError> {
    let inserted = match fetch_order_by_number(&order.order_number, conn).await? {
        Some(order) => (order, false),
        None => {
            let order = insert_order(order, conn).await?;
            debug!("📝️ Order {} inserted with id {}", order.order_number, order.id);
            (order, true)
        },
    };
    Ok(inserted)
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, ReconcileError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                total_amount,
                created_at
            ) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.total_amount)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// The `Unpaid` to `Paid` transition, as a single conditional write.
///
/// The WHERE clause is the whole concurrency story: of any number of concurrent callers, exactly
/// one finds a row that is still unpaid and open, and only that caller gets the updated row back.
/// Everyone else gets `None`.
pub async fn try_mark_paid(
    number: &OrderNumber,
    settlement: &PaymentSettlement,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Paid',
                paid_at = $1,
                payment_method = $2,
                payment_reference = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $4 AND payment_status = 'Unpaid' AND closed = 0
            RETURNING *;
        "#,
    )
    .bind(settlement.paid_at)
    .bind(settlement.method)
    .bind(settlement.reference.as_str())
    .bind(number.as_str())
    .fetch_optional(conn)
    .await?;
    if order.is_some() {
        debug!("📝️ Order {number} marked as paid");
    }
    Ok(order)
}

/// Moves the refund status to `Success` unless it already is. Returns `None` for both "no such
/// order" and "already succeeded"; callers that need to tell those apart fetch the row first.
pub async fn try_record_refund_success(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                refund_status = 'Success',
                updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $1 AND refund_status <> 'Success'
            RETURNING *;
        "#,
    )
    .bind(number.as_str())
    .fetch_optional(conn)
    .await?;
    if order.is_some() {
        debug!("📝️ Refund recorded against order {number}");
    }
    Ok(order)
}

/// Records a failed refund. The failure code goes into the `extra` JSON via `json_set` so that
/// keys written by other processes survive the update.
pub async fn record_refund_failure(
    number: &OrderNumber,
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let path = format!("$.{}", ExtraFields::REFUND_FAILED_CODE);
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                refund_status = 'Failed',
                extra = json_set(extra, $1, $2),
                updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $3
            RETURNING *;
        "#,
    )
    .bind(path)
    .bind(code)
    .bind(number.as_str())
    .fetch_optional(conn)
    .await?;
    if order.is_some() {
        debug!("📝️ Refund failure '{code}' recorded against order {number}");
    }
    Ok(order)
}

/// Closes the order if it has not been paid. Paid orders cannot be closed, so the guard mirrors
/// the one in [`try_mark_paid`]: between the two conditions, a row settles as exactly one of
/// paid or closed.
pub async fn close_order(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                closed = 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $1 AND payment_status = 'Unpaid'
            RETURNING *;
        "#,
    )
    .bind(number.as_str())
    .fetch_optional(conn)
    .await?;
    if order.is_some() {
        debug!("📝️ Order {number} closed");
    }
    Ok(order)
}
