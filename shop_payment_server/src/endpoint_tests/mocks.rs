use mockall::mock;
use shop_payment_engine::{
    db_types::{NewOrder, Order, OrderNumber, PaymentMethod, PaymentSettlement},
    notifications::{PaymentNotification, RefundNotification},
    traits::{NotificationVerifier, OrderStore, ReconcileError, VerificationError},
};

mock! {
    pub OrderStoreImpl {}
    impl Clone for OrderStoreImpl {
        fn clone(&self) -> Self;
    }
    impl OrderStore for OrderStoreImpl {
        fn url(&self) -> &str;
        async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError>;
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), ReconcileError>;
        async fn try_mark_paid(&self, number: &OrderNumber, settlement: &PaymentSettlement) -> Result<Option<Order>, ReconcileError>;
        async fn try_record_refund_success(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError>;
        async fn record_refund_failure(&self, number: &OrderNumber, code: &str) -> Result<Option<Order>, ReconcileError>;
        async fn close_order(&self, number: &OrderNumber) -> Result<Option<Order>, ReconcileError>;
    }
}

mock! {
    pub Verifier {}
    impl Clone for Verifier {
        fn clone(&self) -> Self;
    }
    impl NotificationVerifier for Verifier {
        async fn verify_payment(&self, gateway: PaymentMethod, body: &str) -> Result<PaymentNotification, VerificationError>;
        async fn verify_refund(&self, body: &str) -> Result<RefundNotification, VerificationError>;
    }
}
