use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use shop_payment_engine::{
    db_types::{ExtraFields, Order, OrderNumber, PaymentMethod, PaymentStatus, RefundStatus},
    events::EventProducers,
    notifications::{PaymentNotification, RefundNotification, RefundResult, TradeStatus},
    traits::{ReconcileError, VerificationError},
    ReconcileApi,
};
use spg_common::Cents;

use super::helpers::{get_request, post_form_request};
use crate::{
    endpoint_tests::mocks::{MockOrderStoreImpl, MockVerifier},
    routes::{alipay_notify, alipay_return, health, wechat_notify, wechat_refund_notify},
};

const WECHAT_OK_XML: &str =
    "<xml><return_code><![CDATA[SUCCESS]]></return_code><return_msg><![CDATA[OK]]></return_msg></xml>";
const WECHAT_FAIL_XML: &str =
    "<xml><return_code><![CDATA[FAIL]]></return_code><return_msg><![CDATA[FAIL]]></return_msg></xml>";

#[actix_web::test]
async fn alipay_payment_acks_with_the_success_token() {
    let _ = env_logger::try_init().ok();
    let (status, content_type, body) =
        post_form_request("/notify/alipay", "unused=1", configure_alipay_paid).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/plain; charset=utf-8");
    assert_eq!(body, "success");
}

#[actix_web::test]
async fn duplicate_alipay_payment_still_acks_success() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) =
        post_form_request("/notify/alipay", "unused=1", configure_alipay_already_paid).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");
}

#[actix_web::test]
async fn unknown_order_acks_fail_so_the_gateway_retries() {
    let _ = env_logger::try_init().ok();
    let (status, content_type, body) =
        post_form_request("/notify/alipay", "unused=1", configure_unknown_order).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/plain; charset=utf-8");
    assert_eq!(body, "fail");
}

#[actix_web::test]
async fn verification_failures_never_reach_the_store() {
    let _ = env_logger::try_init().ok();
    // The store mock has no expectations, so any store call panics the worker and fails the test.
    let (status, _, body) =
        post_form_request("/notify/alipay", "forged=1", configure_bad_signature).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "fail");
}

#[actix_web::test]
async fn ignored_statuses_ack_success_without_touching_the_store() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) =
        post_form_request("/notify/alipay", "unused=1", configure_wait_buyer_pay).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");
}

#[actix_web::test]
async fn amount_mismatches_ack_fail_without_writing() {
    let _ = env_logger::try_init().ok();
    // No try_mark_paid expectation: a write attempt would panic the test.
    let (status, _, body) =
        post_form_request("/notify/alipay", "unused=1", configure_amount_mismatch).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "fail");
}

#[actix_web::test]
async fn storage_failures_ack_fail_so_the_gateway_retries() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) =
        post_form_request("/notify/alipay", "unused=1", configure_store_down).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "fail");
}

#[actix_web::test]
async fn wechat_payment_acks_with_the_xml_document() {
    let _ = env_logger::try_init().ok();
    let (status, content_type, body) =
        post_form_request("/notify/wechat", "unused=1", configure_wechat_paid).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/xml; charset=utf-8");
    assert_eq!(body, WECHAT_OK_XML);
}

#[actix_web::test]
async fn wechat_refund_success_acks_with_the_xml_document() {
    let _ = env_logger::try_init().ok();
    let (status, content_type, body) =
        post_form_request("/notify/wechat/refund", "unused=1", configure_refund_success).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/xml; charset=utf-8");
    assert_eq!(body, WECHAT_OK_XML);
}

#[actix_web::test]
async fn wechat_refund_for_unknown_order_acks_with_the_fail_document() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) =
        post_form_request("/notify/wechat/refund", "unused=1", configure_refund_unknown_order)
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, WECHAT_FAIL_XML);
}

#[actix_web::test]
async fn wechat_refund_verification_failure_acks_with_the_fail_document() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) =
        post_form_request("/notify/wechat/refund", "forged=1", configure_bad_signature).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, WECHAT_FAIL_XML);
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/health", configure_health).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn alipay_return_shows_the_success_page() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/return/alipay?unused=1", configure_alipay_paid).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment received"));
    assert!(body.contains("ORD-1001"));
}

#[actix_web::test]
async fn alipay_return_shows_the_error_page_on_bad_signatures() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/return/alipay?forged=1", configure_bad_signature).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment result unknown"));
}

//--------------------------------------   Scenario wiring   ----------------------------------------------------------

fn register(cfg: &mut ServiceConfig, store: MockOrderStoreImpl, verifier: MockVerifier) {
    let api = ReconcileApi::new(store, EventProducers::default());
    cfg.service(web::resource("/notify/alipay").route(web::post().to(alipay_notify::<MockOrderStoreImpl, MockVerifier>)))
        .service(web::resource("/notify/wechat").route(web::post().to(wechat_notify::<MockOrderStoreImpl, MockVerifier>)))
        .service(
            web::resource("/notify/wechat/refund")
                .route(web::post().to(wechat_refund_notify::<MockOrderStoreImpl, MockVerifier>)),
        )
        .service(web::resource("/return/alipay").route(web::get().to(alipay_return::<MockVerifier>)))
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(verifier));
}

fn configure_alipay_paid(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStoreImpl::new();
    store.expect_fetch_order_by_number().returning(|_| Ok(Some(unpaid_order("ORD-1001", 9900))));
    store.expect_try_mark_paid().returning(|_, _| Ok(Some(paid_order("ORD-1001", 9900, "TXN-1"))));
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify_payment()
        .returning(|_, _| Ok(notification("ORD-1001", PaymentMethod::Alipay, TradeStatus::Success, "TXN-1", 9900)));
    register(cfg, store, verifier);
}

fn configure_alipay_already_paid(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStoreImpl::new();
    store.expect_fetch_order_by_number().returning(|_| Ok(Some(paid_order("ORD-1001", 9900, "TXN-1"))));
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify_payment()
        .returning(|_, _| Ok(notification("ORD-1001", PaymentMethod::Alipay, TradeStatus::Success, "TXN-1", 9900)));
    register(cfg, store, verifier);
}

fn configure_unknown_order(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStoreImpl::new();
    store.expect_fetch_order_by_number().returning(|_| Ok(None));
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify_payment()
        .returning(|_, _| Ok(notification("ORD-1002", PaymentMethod::Alipay, TradeStatus::Success, "TXN-2", 9900)));
    register(cfg, store, verifier);
}

fn configure_bad_signature(cfg: &mut ServiceConfig) {
    let store = MockOrderStoreImpl::new();
    let mut verifier = MockVerifier::new();
    verifier.expect_verify_payment().returning(|_, _| Err(VerificationError::InvalidSignature));
    verifier.expect_verify_refund().returning(|_| Err(VerificationError::InvalidSignature));
    register(cfg, store, verifier);
}

fn configure_wait_buyer_pay(cfg: &mut ServiceConfig) {
    let store = MockOrderStoreImpl::new();
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify_payment()
        .returning(|_, _| Ok(notification("ORD-1001", PaymentMethod::Alipay, TradeStatus::WaitBuyerPay, "TXN-1", 9900)));
    register(cfg, store, verifier);
}

fn configure_amount_mismatch(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStoreImpl::new();
    store.expect_fetch_order_by_number().returning(|_| Ok(Some(unpaid_order("ORD-1001", 9900))));
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify_payment()
        .returning(|_, _| Ok(notification("ORD-1001", PaymentMethod::Alipay, TradeStatus::Success, "TXN-1", 100)));
    register(cfg, store, verifier);
}

fn configure_store_down(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStoreImpl::new();
    store
        .expect_fetch_order_by_number()
        .returning(|_| Err(ReconcileError::DatabaseError("database is locked".to_string())));
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify_payment()
        .returning(|_, _| Ok(notification("ORD-1001", PaymentMethod::Alipay, TradeStatus::Success, "TXN-1", 9900)));
    register(cfg, store, verifier);
}

fn configure_wechat_paid(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStoreImpl::new();
    store.expect_fetch_order_by_number().returning(|_| Ok(Some(unpaid_order("ORD-2001", 9900))));
    store.expect_try_mark_paid().returning(|_, _| Ok(Some(paid_order("ORD-2001", 9900, "TXN-9"))));
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify_payment()
        .returning(|_, _| Ok(notification("ORD-2001", PaymentMethod::WeChat, TradeStatus::Success, "TXN-9", 9900)));
    register(cfg, store, verifier);
}

fn configure_refund_success(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStoreImpl::new();
    store.expect_fetch_order_by_number().returning(|_| Ok(Some(paid_order("ORD-2001", 9900, "TXN-9"))));
    store.expect_try_record_refund_success().returning(|_| {
        let mut order = paid_order("ORD-2001", 9900, "TXN-9");
        order.refund_status = RefundStatus::Success;
        Ok(Some(order))
    });
    let mut verifier = MockVerifier::new();
    verifier.expect_verify_refund().returning(|_| Ok(refund_notification("ORD-2001", RefundResult::Success)));
    register(cfg, store, verifier);
}

fn configure_refund_unknown_order(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStoreImpl::new();
    store.expect_fetch_order_by_number().returning(|_| Ok(None));
    let mut verifier = MockVerifier::new();
    verifier.expect_verify_refund().returning(|_| Ok(refund_notification("ORD-404", RefundResult::Success)));
    register(cfg, store, verifier);
}

fn configure_health(cfg: &mut ServiceConfig) {
    cfg.service(health);
}

//--------------------------------------      Fixtures       ----------------------------------------------------------

fn notification(number: &str, method: PaymentMethod, status: TradeStatus, reference: &str, amount: i64) -> PaymentNotification {
    PaymentNotification {
        order_number: OrderNumber::from(number.to_string()),
        method,
        trade_status: status,
        reference: reference.to_string(),
        amount: Cents::from(amount),
        paid_at: Utc.with_ymd_and_hms(2024, 8, 10, 10, 0, 0).unwrap(),
    }
}

fn refund_notification(number: &str, result: RefundResult) -> RefundNotification {
    RefundNotification { order_number: OrderNumber::from(number.to_string()), result }
}

fn unpaid_order(number: &str, amount: i64) -> Order {
    Order {
        id: 1,
        order_number: OrderNumber::from(number.to_string()),
        total_amount: Cents::from(amount),
        payment_status: PaymentStatus::Unpaid,
        paid_at: None,
        payment_method: None,
        payment_reference: None,
        closed: false,
        refund_status: RefundStatus::None,
        extra: ExtraFields::default(),
        created_at: Utc.with_ymd_and_hms(2024, 8, 10, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 8, 10, 9, 30, 0).unwrap(),
    }
}

fn paid_order(number: &str, amount: i64, reference: &str) -> Order {
    Order {
        payment_status: PaymentStatus::Paid,
        paid_at: Some(Utc.with_ymd_and_hms(2024, 8, 10, 10, 0, 0).unwrap()),
        payment_method: Some(PaymentMethod::Alipay),
        payment_reference: Some(reference.to_string()),
        updated_at: Utc.with_ymd_and_hms(2024, 8, 10, 10, 0, 0).unwrap(),
        ..unpaid_order(number, amount)
    }
}
