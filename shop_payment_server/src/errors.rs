use actix_web::{error::ResponseError, http::header::ContentType, HttpResponse};
use thiserror::Error;

/// Faults raised while configuring, starting or running the server.
///
/// The notification endpoints never surface one of these. The gateways only
/// understand the ack bodies, so the notify handlers always answer through
/// [`crate::ack`] and fold their failures into it. `ServerError` covers
/// everything else and renders as a small JSON document.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server startup failed. {0}")]
    StartupError(String),
    #[error("I/O error. {0}")]
    IoError(#[from] std::io::Error),
    #[error("Bad server configuration. {0}")]
    ConfigError(String),
    #[error("The server stopped unexpectedly. {0}")]
    RuntimeError(String),
}

impl ResponseError for ServerError {
    // All variants are server-side faults, so the default 500 status stands.
    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({ "error": self.to_string() }).to_string();
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body)
    }
}
