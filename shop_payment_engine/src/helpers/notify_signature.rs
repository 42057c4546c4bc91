//! # Notification signature format
//!
//! Both gateways sign their server-to-server callbacks so that the engine can tell a genuine
//! notification from a forged one. A forged "your order is paid" POST is free money for the
//! attacker, so verification happens before any field of the payload is believed.
//!
//! ## Message format
//!
//! The signed message is the canonical form of the form-encoded parameters:
//!
//! ```text
//!    k1=v1&k2=v2&...&kn=vn
//! ```
//!
//! where
//!   * the `sign` parameter itself is excluded,
//!   * parameters with empty values are excluded,
//!   * the remaining parameters are sorted by key, byte-wise ascending.
//!
//! The signature is the base64-encoded HMAC-SHA256 of that message under the per-gateway shared
//! secret. Verification recomputes the MAC rather than comparing encoded strings, so it runs in
//! constant time with respect to the supplied signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The form field that carries the signature itself.
pub const SIGNATURE_FIELD: &str = "sign";

/// Builds the canonical message for a set of notification parameters.
pub fn canonical_message(params: &[(String, String)]) -> String {
    let mut fields = params
        .iter()
        .filter(|(k, v)| k != SIGNATURE_FIELD && !v.is_empty())
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect::<Vec<_>>();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    fields.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
}

/// Signs a canonical message with the shared secret. Used by the test suites to build valid
/// notifications; production signatures are produced by the gateways.
pub fn sign_message(message: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    base64::encode(mac.finalize().into_bytes())
}

/// Verifies a signature over the canonical form of `params`. Returns `false` for a wrong MAC and
/// for a signature that is not valid base64.
pub fn verify_signature(params: &[(String, String)], signature: &str, secret: &str) -> bool {
    let Ok(sig_bytes) = base64::decode(signature) else {
        return false;
    };
    let message = canonical_message(params);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    mac.verify_slice(&sig_bytes).is_ok()
}
