//! `SqliteOrderStore` is the concrete SQLite implementation of the engine's storage backend.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders};
use crate::{
    db_types::{NewOrder, Order, OrderNumber, PaymentSettlement},
    traits::{OrderStore, ReconcileError},
};

#[derive(Clone)]
pub struct SqliteOrderStore {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteOrderStore ({:?})", self.pool)
    }
}

impl SqliteOrderStore {
    /// Connects to the database at `SPG_DATABASE_URL`, or the default path if that is not set.
    pub async fn new(max_connections: u32) -> Result<Self, ReconcileError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, ReconcileError> {
        let pool = new_pool(url, max_connections).await?;
        debug!("🗃️ Connected to database {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderStore for SqliteOrderStore {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), ReconcileError> {
        let mut conn = self.pool.acquire().await?;
        let (order, inserted) = orders::idempotent_insert(order, &mut conn).await?;
        if inserted {
            debug!("🗃️ Order {} has been saved in the DB with id {}", order.order_number, order.id);
        }
        Ok((order, inserted))
    }

    async fn try_mark_paid(
        &self,
        number: &OrderNumber,
        settlement: &PaymentSettlement,
    ) -> Result<Option<Order>, ReconcileError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::try_mark_paid(number, settlement, &mut conn).await?;
        Ok(order)
    }

    async fn try_record_refund_success(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::try_record_refund_success(number, &mut conn).await?;
        Ok(order)
    }

    async fn record_refund_failure(&self, number: &OrderNumber, code: &str) -> Result<Option<Order>, ReconcileError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::record_refund_failure(number, code, &mut conn).await?;
        Ok(order)
    }

    async fn close_order(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::close_order(number, &mut conn).await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), ReconcileError> {
        self.pool.close().await;
        info!("🗃️ Database connection closed");
        Ok(())
    }
}
