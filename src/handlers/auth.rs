// Session handlers: Basic login, logout, the landing page and OAuth begin
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::pages::generate_sign_in_page;
use crate::authentication::{AuthGateway, AuthOutcome, OAuthBegin};
use crate::error::AuthError;
use crate::models::{AuthenticatedResponse, MessageResponse};
use crate::utils::responses::ResponseBuilder;

#[derive(Debug, Deserialize)]
pub struct BeginParams {
    /// Post-login redirect target, kept only if it is a relative path
    pub rd: Option<String>,
}

/// `POST /login`
///
/// # Errors
///
/// `AuthError::InvalidCredentials` when neither a valid session cookie nor
/// valid Basic credentials are present
pub async fn login(
    req: HttpRequest,
    gateway: web::Data<AuthGateway>,
) -> Result<HttpResponse, AuthError> {
    match gateway.authenticate(&req) {
        AuthOutcome::Authenticated(session) => Ok(ResponseBuilder::json_with_cookies(
            &MessageResponse::new("Authenticated"),
            session.cookie.into_iter().collect(),
        )),
        AuthOutcome::Unauthorized | AuthOutcome::Anonymous => Err(AuthError::InvalidCredentials),
    }
}

/// `GET /`
///
/// # Errors
///
/// `AuthError::InvalidCredentials` when an `Authorization` header is present
/// but does not verify
pub async fn index(
    req: HttpRequest,
    gateway: web::Data<AuthGateway>,
) -> Result<HttpResponse, AuthError> {
    match gateway.authenticate(&req) {
        AuthOutcome::Authenticated(session) => Ok(ResponseBuilder::json_with_cookies(
            &AuthenticatedResponse::new(session.token),
            session.cookie.into_iter().collect(),
        )),
        AuthOutcome::Unauthorized => Err(AuthError::InvalidCredentials),
        AuthOutcome::Anonymous => Ok(ResponseBuilder::html(generate_sign_in_page(
            gateway.registry(),
        ))),
    }
}

/// `POST /logout`
pub async fn logout(gateway: web::Data<AuthGateway>) -> HttpResponse {
    ResponseBuilder::json_with_cookies(
        &MessageResponse::new("Logged out"),
        vec![gateway.cookies().create_expired_session_cookie()],
    )
}

/// `GET /auth/{provider}`
///
/// # Errors
///
/// `AuthError::UnknownProvider` for an unconfigured provider
pub async fn oauth_begin(
    req: HttpRequest,
    provider: web::Path<String>,
    query: web::Query<BeginParams>,
    gateway: web::Data<AuthGateway>,
) -> Result<HttpResponse, AuthError> {
    let provider = provider.into_inner();

    match gateway.begin_oauth(&req, &provider, query.rd.as_deref())? {
        OAuthBegin::AlreadyAuthenticated(token) => {
            Ok(HttpResponse::Ok().json(AuthenticatedResponse::new(token)))
        }
        OAuthBegin::Redirect {
            location,
            handshake_cookie,
        } => Ok(ResponseBuilder::redirect_with_cookies(
            &location,
            vec![handshake_cookie],
        )),
    }
}
