pub mod notify_signature;
