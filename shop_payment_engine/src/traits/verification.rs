use thiserror::Error;

use crate::{
    db_types::PaymentMethod,
    notifications::{PaymentNotification, RefundNotification},
};

#[derive(Debug, Clone, Error)]
pub enum VerificationError {
    #[error("The notification signature does not match the payload")]
    InvalidSignature,
    #[error("The notification is missing the required field '{0}'")]
    MissingField(String),
    #[error("The notification payload could not be parsed: {0}")]
    MalformedPayload(String),
}

/// Authenticates a raw gateway callback body and extracts the notification it carries.
///
/// Implementations own the transport details (form encoding, signature scheme, per-gateway field
/// names). Nothing downstream of a successful verification re-checks authenticity, so an
/// implementation must not return `Ok` for a payload it could not verify.
#[allow(async_fn_in_trait)]
pub trait NotificationVerifier: Clone {
    async fn verify_payment(
        &self,
        gateway: PaymentMethod,
        body: &str,
    ) -> Result<PaymentNotification, VerificationError>;

    async fn verify_refund(&self, body: &str) -> Result<RefundNotification, VerificationError>;
}
