use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use spg_common::Cents;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------    OrderNumber     ----------------------------------------------------------
/// The merchant-side order number, as assigned by the shop when the order was placed. Both gateways
/// echo it back in their notifications (`out_trade_no`), and it is the key every reconciliation
/// operation uses to find the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   PaymentStatus    ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No settled payment has been recorded against the order.
    Unpaid,
    /// The order has been paid in full. This status is terminal.
    Paid,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "Unpaid"),
            PaymentStatus::Paid => write!(f, "Paid"),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Unpaid");
            PaymentStatus::Unpaid
        })
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Paid" => Ok(Self::Paid),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentMethod    ----------------------------------------------------------
/// The gateway a settled payment came in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    Alipay,
    WeChat,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Alipay => write!(f, "Alipay"),
            PaymentMethod::WeChat => write!(f, "WeChat"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Alipay" | "alipay" => Ok(Self::Alipay),
            "WeChat" | "wechat" => Ok(Self::WeChat),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------    RefundStatus    ----------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RefundStatus {
    /// No refund has ever been requested for this order.
    #[default]
    None,
    /// A refund has been requested and is awaiting the gateway's asynchronous result.
    Pending,
    /// The gateway confirmed the refund. This status is terminal.
    Success,
    /// The gateway reported that the refund could not be completed.
    Failed,
}

impl Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundStatus::None => write!(f, "None"),
            RefundStatus::Pending => write!(f, "Pending"),
            RefundStatus::Success => write!(f, "Success"),
            RefundStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl From<String> for RefundStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid refund status: {value}. But this conversion cannot fail. Defaulting to None");
            RefundStatus::None
        })
    }
}

impl FromStr for RefundStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid refund status: {s}"))),
        }
    }
}

//--------------------------------------    ExtraFields     ----------------------------------------------------------
/// Free-form annotations attached to an order, stored as a JSON object in the `extra` column.
///
/// Writers must never clobber keys they do not own, so all storage-level updates go through SQLite's
/// `json_set` rather than read-modify-write in application code. The keys the engine itself writes
/// are enumerated as constants here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFields(BTreeMap<String, String>);

impl ExtraFields {
    /// The raw gateway status captured when a refund notification reports anything other than success.
    pub const REFUND_FAILED_CODE: &'static str = "refund_failed_code";

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl TryFrom<String> for ExtraFields {
    type Error = serde_json::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let map = serde_json::from_str::<BTreeMap<String, String>>(&value)?;
        Ok(Self(map))
    }
}

//--------------------------------------       Order        ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    /// The full order total. Notified amounts must match this exactly before the order may settle.
    pub total_amount: Cents,
    pub payment_status: PaymentStatus,
    /// When the settled payment was recorded. `None` while the order is unpaid.
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    /// The gateway's trade number for the settled payment (Alipay `trade_no` / WeChat `transaction_id`).
    pub payment_reference: Option<String>,
    /// Closed orders can no longer be paid. Closing happens out of band (expiry, cancellation).
    pub closed: bool,
    pub refund_status: RefundStatus,
    #[sqlx(try_from = "String")]
    pub extra: ExtraFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder      ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The order number assigned by the shop
    pub order_number: OrderNumber,
    /// The full order total
    pub total_amount: Cents,
    /// The time the order was placed
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_number: OrderNumber, total_amount: Cents) -> Self {
        Self { order_number, total_amount, created_at: Utc::now() }
    }
}

//--------------------------------------  PaymentSettlement ----------------------------------------------------------
/// The facts recorded on an order when a settled payment notification transitions it to `Paid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSettlement {
    pub paid_at: DateTime<Utc>,
    pub method: PaymentMethod,
    /// The gateway's trade number
    pub reference: String,
}
