//! The traits the reconciliation engine is built against.
//!
//! [`OrderStore`] is the persistence seam; [`NotificationVerifier`] is the transport seam. The
//! server crate supplies concrete implementations of both, and the endpoint tests supply mocks.

mod order_store;
mod verification;

pub use order_store::{OrderStore, ReconcileError};
pub use verification::{NotificationVerifier, VerificationError};
