//! HTTP response helpers

use actix_web::{cookie::Cookie, http::header, HttpResponse};
use serde::Serialize;

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// 200 with a JSON body and the given cookies
    #[must_use]
    pub fn json_with_cookies<T: Serialize>(body: &T, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut response = HttpResponse::Ok();
        for cookie in cookies {
            response.cookie(cookie);
        }
        response.json(body)
    }

    /// 302 to `location` with the given cookies
    #[must_use]
    pub fn redirect_with_cookies(location: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut response = HttpResponse::Found();
        response.insert_header((header::LOCATION, location));
        for cookie in cookies {
            response.cookie(cookie);
        }
        response.finish()
    }

    /// 200 with an HTML body
    #[must_use]
    pub fn html(body: String) -> HttpResponse {
        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body)
    }
}
