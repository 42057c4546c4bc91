//! The production [`NotificationVerifier`].
//!
//! Both gateways POST `application/x-www-form-urlencoded` bodies and sign them with a shared
//! secret (see [`notify_signature`](shop_payment_engine::helpers::notify_signature) for the
//! scheme). This verifier checks the signature first and only then reads any field, so an
//! unauthenticated payload never influences reconciliation. Field names differ per gateway:
//! Alipay reports `trade_no` and a decimal-yuan `total_amount`, WeChat reports `transaction_id`
//! and an integer-cents `total_fee`.

use chrono::Utc;
use log::*;
use shop_payment_engine::{
    db_types::{OrderNumber, PaymentMethod},
    helpers::notify_signature::{verify_signature, SIGNATURE_FIELD},
    notifications::{PaymentNotification, RefundNotification, RefundResult, TradeStatus},
    traits::{NotificationVerifier, VerificationError},
};
use spg_common::{Cents, Secret};

use crate::config::NotifyConfig;

#[derive(Clone)]
pub struct FormNotificationVerifier {
    alipay_secret: Secret<String>,
    wechat_secret: Secret<String>,
    skip_signature_check: bool,
}

impl FormNotificationVerifier {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            alipay_secret: config.alipay_secret.clone(),
            wechat_secret: config.wechat_secret.clone(),
            skip_signature_check: config.disable_signature_check,
        }
    }

    fn secret_for(&self, gateway: PaymentMethod) -> &str {
        match gateway {
            PaymentMethod::Alipay => self.alipay_secret.reveal(),
            PaymentMethod::WeChat => self.wechat_secret.reveal(),
        }
    }

    fn check_signature(&self, params: &[(String, String)], secret: &str) -> Result<(), VerificationError> {
        if self.skip_signature_check {
            trace!("💳️ Signature checks are disabled. Accepting the notification as-is");
            return Ok(());
        }
        let signature = field(params, SIGNATURE_FIELD)?;
        if verify_signature(params, signature, secret) {
            Ok(())
        } else {
            Err(VerificationError::InvalidSignature)
        }
    }
}

impl NotificationVerifier for FormNotificationVerifier {
    async fn verify_payment(
        &self,
        gateway: PaymentMethod,
        body: &str,
    ) -> Result<PaymentNotification, VerificationError> {
        let params = parse_form(body)?;
        self.check_signature(&params, self.secret_for(gateway))?;
        let order_number = OrderNumber::from(field(&params, "out_trade_no")?.to_string());
        let notification = match gateway {
            PaymentMethod::Alipay => {
                let trade_status = TradeStatus::from(field(&params, "trade_status")?);
                let reference = field(&params, "trade_no")?.to_string();
                let amount = Cents::from_yuan_str(field(&params, "total_amount")?)
                    .map_err(|e| VerificationError::MalformedPayload(e.to_string()))?;
                PaymentNotification {
                    order_number,
                    method: PaymentMethod::Alipay,
                    trade_status,
                    reference,
                    amount,
                    paid_at: Utc::now(),
                }
            },
            PaymentMethod::WeChat => {
                let trade_status = TradeStatus::from(field(&params, "result_code")?);
                let reference = field(&params, "transaction_id")?.to_string();
                let amount = field(&params, "total_fee")?
                    .parse::<i64>()
                    .map(Cents::from)
                    .map_err(|e| VerificationError::MalformedPayload(format!("total_fee is not in cents: {e}")))?;
                PaymentNotification {
                    order_number,
                    method: PaymentMethod::WeChat,
                    trade_status,
                    reference,
                    amount,
                    paid_at: Utc::now(),
                }
            },
        };
        Ok(notification)
    }

    async fn verify_refund(&self, body: &str) -> Result<RefundNotification, VerificationError> {
        let params = parse_form(body)?;
        self.check_signature(&params, self.wechat_secret.reveal())?;
        let order_number = OrderNumber::from(field(&params, "out_trade_no")?.to_string());
        let result = RefundResult::from_raw(field(&params, "refund_status")?);
        Ok(RefundNotification { order_number, result })
    }
}

fn field<'a>(params: &'a [(String, String)], name: &str) -> Result<&'a str, VerificationError> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| VerificationError::MissingField(name.to_string()))
}

/// Decodes a `application/x-www-form-urlencoded` body into key-value pairs, preserving order.
fn parse_form(body: &str) -> Result<Vec<(String, String)>, VerificationError> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| VerificationError::MalformedPayload(format!("'{pair}' is not a key=value pair")))?;
            let key = decode_component(key)?;
            let value = decode_component(value)?;
            Ok((key, value))
        })
        .collect()
}

fn decode_component(raw: &str) -> Result<String, VerificationError> {
    // Form encoding spells spaces as '+'. Substitute before percent-decoding so that %2B still
    // decodes to a literal plus, which base64 signatures rely on.
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|v| v.into_owned())
        .map_err(|e| VerificationError::MalformedPayload(format!("'{raw}' is not valid percent-encoding: {e}")))
}
