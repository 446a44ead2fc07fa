use actix_web::{HttpResponse, Result};

use crate::models::MessageResponse;

/// Liveness endpoint, no authentication
///
/// # Errors
/// Never fails; the signature matches the other handlers
pub async fn status() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(MessageResponse::new("ok")))
}
