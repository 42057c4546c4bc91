//! The verified content of gateway callbacks.
//!
//! Values of these types only exist after a transport-layer verifier has checked the notification's
//! signature and extracted the fields, so the reconciliation logic can treat them as authentic.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use spg_common::Cents;

use crate::db_types::{OrderNumber, PaymentMethod};

//--------------------------------------    TradeStatus     ----------------------------------------------------------
/// The gateway's view of the trade, normalised across Alipay and WeChat vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeStatus {
    /// The buyer has paid (Alipay `TRADE_SUCCESS`, WeChat `SUCCESS`)
    Success,
    /// The trade has completed and can no longer be refunded through the gateway (Alipay `TRADE_FINISHED`)
    Finished,
    /// The trade was created but the buyer has not paid yet (Alipay `WAIT_BUYER_PAY`, WeChat
    /// `NOTPAY` / `USERPAYING`)
    WaitBuyerPay,
    /// The trade was closed without a settled payment
    Closed,
    /// A status this engine does not recognise. Carried verbatim for logging.
    Other(String),
}

impl TradeStatus {
    /// Whether this status represents money actually received. Only settled statuses may move an
    /// order to `Paid`; everything else is acknowledged and ignored.
    pub fn is_settled(&self) -> bool {
        matches!(self, TradeStatus::Success | TradeStatus::Finished)
    }
}

impl From<&str> for TradeStatus {
    fn from(s: &str) -> Self {
        match s {
            "TRADE_SUCCESS" | "SUCCESS" => TradeStatus::Success,
            "TRADE_FINISHED" => TradeStatus::Finished,
            "WAIT_BUYER_PAY" | "NOTPAY" | "USERPAYING" => TradeStatus::WaitBuyerPay,
            "TRADE_CLOSED" | "CLOSED" => TradeStatus::Closed,
            s => TradeStatus::Other(s.to_string()),
        }
    }
}

impl FromStr for TradeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TradeStatus::from(s))
    }
}

impl Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStatus::Success => write!(f, "Success"),
            TradeStatus::Finished => write!(f, "Finished"),
            TradeStatus::WaitBuyerPay => write!(f, "WaitBuyerPay"),
            TradeStatus::Closed => write!(f, "Closed"),
            TradeStatus::Other(s) => write!(f, "Other({s})"),
        }
    }
}

//--------------------------------------PaymentNotification ----------------------------------------------------------
/// A verified payment callback from a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub order_number: OrderNumber,
    pub method: PaymentMethod,
    pub trade_status: TradeStatus,
    /// The gateway's trade number for this payment
    pub reference: String,
    /// The amount the gateway says was paid
    pub amount: Cents,
    pub paid_at: DateTime<Utc>,
}

//--------------------------------------  RefundNotification ---------------------------------------------------------
/// A verified refund-result callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundNotification {
    pub order_number: OrderNumber,
    pub result: RefundResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundResult {
    Success,
    /// The gateway could not complete the refund. `code` is the raw status it reported.
    Failed { code: String },
}

impl RefundResult {
    /// Gateways report refund outcomes as a bare status string. Anything other than an exact
    /// `SUCCESS` is treated as a failure, with the raw value preserved for the audit trail.
    pub fn from_raw(raw: &str) -> Self {
        if raw == "SUCCESS" {
            RefundResult::Success
        } else {
            RefundResult::Failed { code: raw.to_string() }
        }
    }
}
