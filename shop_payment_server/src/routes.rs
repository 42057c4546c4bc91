//! Request handlers for the notification and return endpoints.
//!
//! The notification handlers share one rule: every path through them ends in an HTTP 200 carrying
//! one of the [`Ack`] bodies. Gateways treat any other status as a delivery failure and retry, so
//! errors are never allowed to bubble out to actix's default error responses. The handlers are
//! generic over the store and verifier so the endpoint tests can swap in mocks.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use shop_payment_engine::{
    db_types::PaymentMethod,
    traits::{NotificationVerifier, OrderStore},
    ReconcileApi,
};

use crate::ack::{payment_reply, refund_reply, Ack};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Notifications  ----------------------------------------------
/// POST handler for Alipay's asynchronous payment notification.
pub async fn alipay_notify<B, V>(body: String, api: web::Data<ReconcileApi<B>>, verifier: web::Data<V>) -> HttpResponse
where
    B: OrderStore,
    V: NotificationVerifier,
{
    trace!("💳️ Received Alipay notification ({} bytes)", body.len());
    let notification = match verifier.verify_payment(PaymentMethod::Alipay, &body).await {
        Ok(n) => n,
        Err(e) => {
            warn!("💳️ Alipay notification failed verification. {e}");
            return Ack::text_fail().into_response();
        },
    };
    let number = notification.order_number.clone();
    let result = api.reconcile_payment(notification).await;
    match &result {
        Ok(outcome) => debug!("💳️ Alipay notification for order {number} handled. {outcome:?}"),
        Err(e) => warn!("💳️ Alipay notification for order {number} was not reconciled. {e}"),
    }
    payment_reply(PaymentMethod::Alipay, &result).into_response()
}

/// POST handler for WeChat's asynchronous payment notification.
pub async fn wechat_notify<B, V>(body: String, api: web::Data<ReconcileApi<B>>, verifier: web::Data<V>) -> HttpResponse
where
    B: OrderStore,
    V: NotificationVerifier,
{
    trace!("💳️ Received WeChat notification ({} bytes)", body.len());
    let notification = match verifier.verify_payment(PaymentMethod::WeChat, &body).await {
        Ok(n) => n,
        Err(e) => {
            warn!("💳️ WeChat notification failed verification. {e}");
            return Ack::text_fail().into_response();
        },
    };
    let number = notification.order_number.clone();
    let result = api.reconcile_payment(notification).await;
    match &result {
        Ok(outcome) => debug!("💳️ WeChat notification for order {number} handled. {outcome:?}"),
        Err(e) => warn!("💳️ WeChat notification for order {number} was not reconciled. {e}"),
    }
    payment_reply(PaymentMethod::WeChat, &result).into_response()
}

/// POST handler for WeChat's asynchronous refund-result notification.
pub async fn wechat_refund_notify<B, V>(
    body: String,
    api: web::Data<ReconcileApi<B>>,
    verifier: web::Data<V>,
) -> HttpResponse
where
    B: OrderStore,
    V: NotificationVerifier,
{
    trace!("💳️ Received WeChat refund notification ({} bytes)", body.len());
    let notification = match verifier.verify_refund(&body).await {
        Ok(n) => n,
        Err(e) => {
            warn!("💳️ WeChat refund notification failed verification. {e}");
            return Ack::wechat_refund_fail().into_response();
        },
    };
    let number = notification.order_number.clone();
    let result = api.reconcile_refund(notification).await;
    match &result {
        Ok(outcome) => debug!("💳️ WeChat refund notification for order {number} handled. {outcome:?}"),
        Err(e) => warn!("💳️ WeChat refund notification for order {number} was not reconciled. {e}"),
    }
    refund_reply(&result).into_response()
}

//----------------------------------------------   Browser return  ----------------------------------------------
/// GET handler for the browser redirect after an Alipay payment.
///
/// This is a display-only leg. The asynchronous notification is the source of truth for order
/// state, so this handler never touches the store; it verifies the signed query string and shows
/// the customer a success or error page.
pub async fn alipay_return<V>(req: HttpRequest, verifier: web::Data<V>) -> HttpResponse
where V: NotificationVerifier {
    trace!("💳️ Received Alipay return redirect");
    match verifier.verify_payment(PaymentMethod::Alipay, req.query_string()).await {
        Ok(n) => {
            debug!("💳️ Alipay return for order {} verified", n.order_number);
            let page = format!(
                "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Payment received</title></head><body>\
                 <h1>Payment received</h1><p>Thank you. Order {} has been paid ({}).</p></body></html>",
                n.order_number, n.amount
            );
            HttpResponse::Ok().content_type("text/html; charset=utf-8").body(page)
        },
        Err(e) => {
            warn!("💳️ Alipay return failed verification. {e}");
            let page = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Payment result unknown</title>\
                        </head><body><h1>Payment result unknown</h1><p>We could not confirm the payment result from \
                        this page. Please check the order status in your account.</p></body></html>";
            HttpResponse::Ok().content_type("text/html; charset=utf-8").body(page)
        },
    }
}
