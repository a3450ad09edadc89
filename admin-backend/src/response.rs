//! JSON envelope shared by every endpoint: `{ "data": .. }` or `{ "error": ".." }`

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::fmt::Display;

#[derive(Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(DataResponse { data })
}

/// DELETE answers 200 either way; `deleted` says whether a row went away
pub fn deleted(id: String, deleted: bool) -> HttpResponse {
    ok(DeleteResponse { id, deleted })
}

pub fn error(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: message.into(),
    })
}

pub fn bad_request(message: impl Into<String>) -> HttpResponse {
    error(StatusCode::BAD_REQUEST, message)
}

pub fn unauthorized(message: impl Into<String>) -> HttpResponse {
    error(StatusCode::UNAUTHORIZED, message)
}

pub fn forbidden(message: impl Into<String>) -> HttpResponse {
    error(StatusCode::FORBIDDEN, message)
}

pub fn not_found(message: impl Into<String>) -> HttpResponse {
    error(StatusCode::NOT_FOUND, message)
}

/// Log the underlying failure and answer with a generic 500
pub fn internal_error(context: &str, err: impl Display) -> HttpResponse {
    log::error!("{}: {}", context, err);
    error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Malformed JSON bodies become a 400 in the usual envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid JSON body: {}", err));
        InternalError::from_response(err, response).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid query string: {}", err));
        InternalError::from_response(err, response).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_envelopes() {
        let body = to_bytes(ok(vec![1, 2]).into_body()).await.unwrap();
        assert_eq!(body, r#"{"data":[1,2]}"#);

        let resp = forbidden("Insufficient role");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, r#"{"error":"Insufficient role"}"#);
    }

    #[actix_web::test]
    async fn test_internal_error_hides_detail() {
        let resp = internal_error("Failed to load", "disk I/O error");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, r#"{"error":"Internal server error"}"#);
    }
}
