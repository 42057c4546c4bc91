//! Gateway acknowledgements.
//!
//! The reply bodies in this module are contracts with the gateways, not with our own clients. Each
//! gateway parses the body to decide whether to stop retrying the notification, and each expects
//! its own exact literal. Always HTTP 200: the retry signal lives in the body, and a non-200 would
//! be interpreted as a delivery failure rather than a processed result.

use actix_web::HttpResponse;
use shop_payment_engine::{
    db_types::PaymentMethod,
    traits::ReconcileError,
    PaymentOutcome,
    RefundOutcome,
};

const ALIPAY_SUCCESS: &str = "success";
const ALIPAY_FAIL: &str = "fail";
const WECHAT_SUCCESS: &str =
    "<xml><return_code><![CDATA[SUCCESS]]></return_code><return_msg><![CDATA[OK]]></return_msg></xml>";
const WECHAT_REFUND_FAIL: &str =
    "<xml><return_code><![CDATA[FAIL]]></return_code><return_msg><![CDATA[FAIL]]></return_msg></xml>";

//--------------------------------------        Ack         ----------------------------------------------------------
/// One wire-level reply to a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    body: &'static str,
    content_type: &'static str,
}

impl Ack {
    pub fn text_success() -> Self {
        Self { body: ALIPAY_SUCCESS, content_type: "text/plain; charset=utf-8" }
    }

    pub fn text_fail() -> Self {
        Self { body: ALIPAY_FAIL, content_type: "text/plain; charset=utf-8" }
    }

    pub fn wechat_success() -> Self {
        Self { body: WECHAT_SUCCESS, content_type: "text/xml; charset=utf-8" }
    }

    pub fn wechat_refund_fail() -> Self {
        Self { body: WECHAT_REFUND_FAIL, content_type: "text/xml; charset=utf-8" }
    }

    pub fn body(&self) -> &'static str {
        self.body
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::Ok().content_type(self.content_type).body(self.body)
    }
}

//--------------------------------------   Outcome mapping  ----------------------------------------------------------
/// Maps a payment reconciliation result onto the reply the gateway expects.
///
/// Every [`PaymentOutcome`] is a success ack, including duplicates and ignored statuses: the
/// notification was received and handled, so the gateway must stop retrying. Every error is the
/// failure ack, so the gateway retries. That covers transient storage faults (the retry will
/// succeed later) as well as unknown orders (the retry papers over a read-replica race).
pub fn payment_reply(gateway: PaymentMethod, result: &Result<PaymentOutcome, ReconcileError>) -> Ack {
    match (gateway, result) {
        (PaymentMethod::Alipay, Ok(_)) => Ack::text_success(),
        (PaymentMethod::WeChat, Ok(_)) => Ack::wechat_success(),
        (_, Err(_)) => Ack::text_fail(),
    }
}

/// Maps a refund reconciliation result onto the reply WeChat expects.
///
/// Success and failure *results* both ack as success: either way the refund outcome was recorded.
/// Only a refund against an unknown order (or a storage fault) gets the failure document.
pub fn refund_reply(result: &Result<RefundOutcome, ReconcileError>) -> Ack {
    match result {
        Ok(_) => Ack::wechat_success(),
        Err(_) => Ack::wechat_refund_fail(),
    }
}
