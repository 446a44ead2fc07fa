// OAuth callback handler
use actix_web::error::QueryPayloadError;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use crate::authentication::AuthGateway;
use crate::error::AuthError;
use crate::models::IdentityResponse;
use crate::oauth::CallbackParams;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;

/// `GET /auth/{provider}/callback`
///
/// Success returns the identity with a fresh session cookie and clears the
/// handshake binding. Failures return the generic error body and set no
/// cookie.
pub async fn oauth_callback(
    req: HttpRequest,
    provider: web::Path<String>,
    query: web::Query<CallbackParams>,
    gateway: web::Data<AuthGateway>,
) -> HttpResponse {
    let provider = provider.into_inner();

    match gateway.complete_oauth(&req, &provider, &query).await {
        Ok(completion) => ResponseBuilder::json_with_cookies(
            &IdentityResponse::new(
                &completion.identity,
                completion.token,
                completion.redirect_url,
            ),
            vec![
                completion.session_cookie,
                completion.cleared_handshake_cookie,
            ],
        ),
        Err(error) => {
            LoggingHelper::log_handshake_rejected(&provider, &error);
            error.error_response()
        }
    }
}

/// Query extractor settings for the callback route
///
/// Unparseable callback queries get the same generic failure as any other
/// rejected handshake.
#[must_use]
pub fn callback_query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, req: &HttpRequest| {
        log::warn!("Rejected callback query on {}: {err}", req.path());
        AuthError::HandshakeNonceMismatch.into()
    })
}
