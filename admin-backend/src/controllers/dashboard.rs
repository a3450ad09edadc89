use actix_web::{web, HttpRequest, Responder};
use chrono::Utc;

use crate::middleware::session_auth::require_role;
use crate::models::STAFF;
use crate::response::{internal_error, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/admin/stats").route(web::get().to(get_stats)));
}

async fn get_stats(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    match state.db.dashboard_stats(Utc::now().date_naive()) {
        Ok(stats) => ok(stats),
        Err(e) => internal_error("Failed to load dashboard stats", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::controllers::test_support::{bearer, test_app, test_state, user_with_token};
    use crate::models::{AttendanceRecord, Role};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::Utc;
    use serde_json::Value;

    #[actix_web::test]
    async fn test_stats_for_staff() {
        let state = test_state();
        let (_, manager) = user_with_token(&state, "manager@example.com", Role::Manager);
        let (employee, employee_token) = user_with_token(&state, "emp@example.com", Role::Employee);
        state
            .db
            .insert_attendance(&AttendanceRecord::open(&employee.id, Utc::now(), 9, 15))
            .unwrap();
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/admin/stats")
            .insert_header(bearer(&manager))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total_users"], 2);
        assert_eq!(body["data"]["active_users"], 2);
        assert_eq!(body["data"]["attendance_today"], 1);
        assert_eq!(body["data"]["mrr"], 0.0);

        let req = test::TestRequest::get()
            .uri("/api/admin/stats")
            .insert_header(bearer(&employee_token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get().uri("/api/admin/stats").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
