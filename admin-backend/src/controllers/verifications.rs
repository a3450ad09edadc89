use actix_web::{web, HttpRequest, Responder};

use crate::db::{embed, Database, Filter, Page, Required};
use crate::middleware::session_auth::require_role;
use crate::models::{
    ListVerificationsQuery, ReviewVerificationRequest, SubmitVerificationRequest, Verification, VerificationView,
    ADMIN_ONLY, ANY_ROLE,
};
use crate::response::{bad_request, internal_error, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/verifications")
            .route("", web::get().to(list_verifications))
            .route("/{id}", web::patch().to(review_verification)),
    )
    .service(web::resource("/api/verifications").route(web::post().to(submit_verification)));
}

fn with_profiles(db: &Database, verifications: Vec<Verification>) -> rusqlite::Result<Vec<VerificationView>> {
    let index = db.profiles_for(&verifications, |v| {
        [Some(v.profile_id.as_str()), v.reviewed_by.as_deref()]
    })?;
    Ok(verifications
        .into_iter()
        .map(|verification| VerificationView {
            profile: embed(&index, Some(&verification.profile_id)),
            reviewer: embed(&index, verification.reviewed_by.as_deref()),
            verification,
        })
        .collect())
}

async fn list_verifications(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListVerificationsQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let filter = Filter::new().eq("status", query.status);
    let verifications = state
        .db
        .list_verifications(&filter, Page::new(query.limit, query.offset))
        .and_then(|verifications| with_profiles(&state.db, verifications));
    match verifications {
        Ok(verifications) => ok(verifications),
        Err(e) => internal_error("Failed to list verifications", e),
    }
}

async fn submit_verification(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SubmitVerificationRequest>,
) -> impl Responder {
    let caller = match require_role(&state, &req, ANY_ROLE).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let verification = match Verification::from_request(&body, &caller.id) {
        Ok(verification) => verification,
        Err(msg) => return bad_request(msg),
    };
    let saved = state
        .db
        .insert_verification(&verification)
        .and_then(|()| with_profiles(&state.db, vec![verification]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to submit verification", e),
    }
}

async fn review_verification(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ReviewVerificationRequest>,
) -> impl Responder {
    let caller = match require_role(&state, &req, ADMIN_ONLY).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let mut verification = match state.db.get_verification(&path).required() {
        Ok(verification) => verification,
        Err(e) => return internal_error("Failed to review verification", e),
    };
    let decision = match body.decision() {
        Ok(decision) => decision,
        Err(msg) => return bad_request(msg),
    };
    verification.review(decision, &caller.id);
    log::info!(
        "{} marked verification {} as {}",
        caller.email,
        verification.id,
        verification.status
    );

    let saved = state
        .db
        .save_verification(&verification)
        .and_then(|()| with_profiles(&state.db, vec![verification]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to review verification", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::controllers::test_support::{bearer, test_app, test_state, user_with_token};
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_submit_and_review() {
        let state = test_state();
        let (admin, admin_token) = user_with_token(&state, "admin@example.com", Role::Admin);
        let (owner, owner_token) = user_with_token(&state, "owner@example.com", Role::Employee);
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/verifications")
            .insert_header(bearer(&owner_token))
            .set_json(json!({ "business_name": "Acme Ltd" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/verifications")
            .insert_header(bearer(&owner_token))
            .set_json(json!({ "business_name": "Acme Ltd", "registration_number": "RC-1029" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["profile"]["id"], owner.id.as_str());
        assert!(body["data"]["reviewer"].is_null());
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/admin/verifications/{}", id);
        for invalid in [json!({ "status": "rejected" }), json!({ "status": "pending" }), json!({})] {
            let req = test::TestRequest::patch()
                .uri(&uri)
                .insert_header(bearer(&admin_token))
                .set_json(invalid)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "status": "rejected", "rejection_reason": "certificate expired" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "rejected");
        assert_eq!(body["data"]["rejection_reason"], "certificate expired");
        assert_eq!(body["data"]["reviewer"]["id"], admin.id.as_str());
        assert!(body["data"]["reviewed_at"].is_string());

        let req = test::TestRequest::get()
            .uri("/api/admin/verifications?status=pending")
            .insert_header(bearer(&admin_token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_review_is_admin_only() {
        let state = test_state();
        let (_, manager_token) = user_with_token(&state, "manager@example.com", Role::Manager);
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/admin/verifications")
            .insert_header(bearer(&manager_token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::patch()
            .uri("/api/admin/verifications/anything")
            .insert_header(bearer(&manager_token))
            .set_json(json!({ "status": "approved" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
