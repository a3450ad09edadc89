use actix_web::{web, HttpRequest, Responder};
use serde::Serialize;

use crate::middleware::session_auth::{authenticate, extract_token};
use crate::models::{IssueSessionRequest, SessionResponse};
use crate::response::{bad_request, internal_error, not_found, ok, unauthorized};
use crate::AppState;

const SERVICE_KEY_HEADER: &str = "X-Service-Key";

#[derive(Serialize)]
pub struct ValidateResponse {
    valid: bool,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    revoked: bool,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/sessions", web::post().to(issue_session))
            .route("/logout", web::post().to(logout))
            .route("/validate", web::get().to(validate)),
    );
    cfg.service(web::resource("/api/me").route(web::get().to(me)));
}

fn has_service_key(state: &AppState, req: &HttpRequest) -> bool {
    req.headers()
        .get(SERVICE_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|key| key == state.config.secret_key)
        .unwrap_or(false)
}

/// Issue a local session for an existing profile; callers prove themselves with the service key
async fn issue_session(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<IssueSessionRequest>,
) -> impl Responder {
    if !has_service_key(&state, &req) {
        return unauthorized("Missing or invalid service key");
    }
    if state.verifier.name() != "local" {
        return bad_request("Sessions are issued by the external auth provider");
    }

    let profile_id = match body.profile_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return bad_request("profile_id is required"),
    };

    let profile = match state.db.get_profile(profile_id) {
        Ok(Some(profile)) => profile,
        Ok(None) => return not_found("Profile not found"),
        Err(e) => return internal_error("Failed to load profile", e),
    };
    if !profile.is_active {
        return bad_request("Profile is deactivated");
    }

    match state.db.create_session(&profile.id, state.config.session_ttl_hours) {
        Ok(session) => {
            log::info!("Issued session for {}", profile.email);
            ok(SessionResponse::from(session))
        }
        Err(e) => internal_error("Failed to create session", e),
    }
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let token = match extract_token(&req) {
        Some(token) => token,
        None => return unauthorized("No authorization token provided"),
    };

    match state.verifier.revoke(&token).await {
        Ok(revoked) => ok(LogoutResponse { revoked }),
        Err(e) => internal_error("Failed to revoke session", e),
    }
}

/// Never fails: any problem resolving the token just means "not valid"
async fn validate(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let valid = match extract_token(&req) {
        Some(token) => match state.verifier.verify(&token).await {
            Ok(profile_id) => profile_id.is_some(),
            Err(e) => {
                log::warn!("Token validation failed: {}", e);
                false
            }
        },
        None => false,
    };
    ok(ValidateResponse { valid })
}

async fn me(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match authenticate(&state, &req).await {
        Ok(profile) => ok(profile),
        Err(resp) => resp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{bearer, test_app, test_state, user_with_token, SERVICE_KEY};
    use crate::db::test_support::seed_profile;
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_web::test]
    async fn test_issue_session_requires_service_key() {
        let state = test_state();
        let profile = seed_profile(&state.db, "staff@example.com", Role::Manager);
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/sessions")
            .set_json(serde_json::json!({ "profile_id": profile.id }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/auth/sessions")
            .insert_header((SERVICE_KEY_HEADER, SERVICE_KEY))
            .set_json(serde_json::json!({ "profile_id": profile.id }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let token = body["data"]["token"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["profile_id"], profile.id.as_str());

        let req = test::TestRequest::get().uri("/api/me").insert_header(bearer(&token)).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["email"], "staff@example.com");
        assert_eq!(body["data"]["role"], "manager");
    }

    #[actix_web::test]
    async fn test_issue_session_validation() {
        let state = test_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/sessions")
            .insert_header((SERVICE_KEY_HEADER, SERVICE_KEY))
            .set_json(serde_json::json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/auth/sessions")
            .insert_header((SERVICE_KEY_HEADER, SERVICE_KEY))
            .set_json(serde_json::json!({ "profile_id": "missing" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/auth/sessions")
            .insert_header((SERVICE_KEY_HEADER, SERVICE_KEY))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[actix_web::test]
    async fn test_validate_and_logout() {
        let state = test_state();
        let (_, token) = user_with_token(&state, "emp@example.com", Role::Employee);
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/auth/validate").insert_header(bearer(&token)).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["valid"], true);

        let req = test::TestRequest::post().uri("/api/auth/logout").insert_header(bearer(&token)).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["revoked"], true);

        let req = test::TestRequest::get().uri("/api/auth/validate").insert_header(bearer(&token)).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["valid"], false);

        let req = test::TestRequest::get().uri("/api/me").insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
