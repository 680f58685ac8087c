//! Caller identity.
//!
//! Session resolution happens in front of this service; by the time a request
//! arrives the authenticated principal is an opaque id in `X-Principal-Id`.

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError};
use docket_common::responses::ErrorResponse;
use std::future::{ready, Ready};

pub const PRINCIPAL_HEADER: &str = "X-Principal-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

#[derive(Debug, thiserror::Error)]
#[error("missing or empty X-Principal-Id header")]
pub struct MissingPrincipal;

impl ResponseError for MissingPrincipal {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized().json(ErrorResponse {
            code: "UNAUTHENTICATED".to_string(),
            message: self.to_string(),
        })
    }
}

impl FromRequest for Principal {
    type Error = MissingPrincipal;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let principal = req
            .headers()
            .get(PRINCIPAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Principal(v.to_string()))
            .ok_or(MissingPrincipal);
        ready(principal)
    }
}
