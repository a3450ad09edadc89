use actix_web::{web, HttpRequest, Responder};
use chrono::Utc;

use crate::db::{columns, embed, Database, Filter, Page, Required};
use crate::middleware::session_auth::require_role;
use crate::models::{
    AttendanceRangeQuery, AttendanceRecord, AttendanceTotals, AttendanceView, CorrectAttendanceRequest,
    ListAttendanceQuery, ANY_ROLE, STAFF,
};
use crate::response::{bad_request, internal_error, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/attendance")
            .route("/clock-in", web::post().to(clock_in))
            .route("/clock-out", web::post().to(clock_out))
            .route("/me", web::get().to(my_attendance)),
    )
    .service(
        web::scope("/api/admin/attendance")
            .route("", web::get().to(list_attendance))
            .route("/summary", web::get().to(summary))
            .route("/{id}", web::patch().to(correct_attendance)),
    );
}

fn with_profiles(db: &Database, records: Vec<AttendanceRecord>) -> rusqlite::Result<Vec<AttendanceView>> {
    let index = db.profiles_for(&records, |r| [Some(r.profile_id.as_str())])?;
    Ok(records
        .into_iter()
        .map(|record| AttendanceView {
            profile: embed(&index, Some(&record.profile_id)),
            record,
        })
        .collect())
}

fn totals_with_profiles(db: &Database, filter: &Filter) -> rusqlite::Result<Vec<AttendanceTotals>> {
    let mut totals = db.attendance_totals(filter)?;
    let index = db.profiles_for(&totals, |t| [Some(t.profile_id.as_str())])?;
    for entry in &mut totals {
        entry.profile = embed(&index, Some(&entry.profile_id));
    }
    Ok(totals)
}

async fn clock_in(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let caller = match require_role(&state, &req, ANY_ROLE).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let record = AttendanceRecord::open(
        &caller.id,
        Utc::now(),
        state.config.workday_start_hour,
        state.config.workday_grace_minutes,
    );
    match state.db.start_shift(&record) {
        Ok(true) => {
            log::info!("{} clocked in ({})", caller.email, record.status);
            ok(record)
        }
        Ok(false) => bad_request("Already clocked in"),
        Err(e) => internal_error("Failed to clock in", e),
    }
}

async fn clock_out(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let caller = match require_role(&state, &req, ANY_ROLE).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let mut record = match state.db.open_attendance_for(&caller.id) {
        Ok(Some(record)) => record,
        Ok(None) => return bad_request("Not clocked in"),
        Err(e) => return internal_error("Failed to check open shift", e),
    };

    record.close(Utc::now());
    match state.db.save_attendance(&record) {
        Ok(()) => ok(record),
        Err(e) => internal_error("Failed to clock out", e),
    }
}

async fn my_attendance(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<AttendanceRangeQuery>,
) -> impl Responder {
    let caller = match require_role(&state, &req, ANY_ROLE).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let filter = Filter::new()
        .eq("profile_id", Some(&caller.id))
        .gte("work_date", columns::opt_day(&query.from))
        .lte("work_date", columns::opt_day(&query.to));
    match state.db.list_attendance(&filter, Page::new(query.limit, query.offset)) {
        Ok(records) => ok(records),
        Err(e) => internal_error("Failed to list attendance", e),
    }
}

async fn list_attendance(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListAttendanceQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let filter = Filter::new()
        .eq("profile_id", query.profile_id.as_deref())
        .eq("status", query.status)
        .gte("work_date", columns::opt_day(&query.from))
        .lte("work_date", columns::opt_day(&query.to));
    let records = state
        .db
        .list_attendance(&filter, Page::new(query.limit, query.offset))
        .and_then(|records| with_profiles(&state.db, records));
    match records {
        Ok(records) => ok(records),
        Err(e) => internal_error("Failed to list attendance", e),
    }
}

async fn summary(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<AttendanceRangeQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let filter = Filter::new()
        .gte("work_date", columns::opt_day(&query.from))
        .lte("work_date", columns::opt_day(&query.to));
    match totals_with_profiles(&state.db, &filter) {
        Ok(totals) => ok(totals),
        Err(e) => internal_error("Failed to summarise attendance", e),
    }
}

async fn correct_attendance(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CorrectAttendanceRequest>,
) -> impl Responder {
    let caller = match require_role(&state, &req, STAFF).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let mut record = match state.db.get_attendance(&path).required() {
        Ok(record) => record,
        Err(e) => return internal_error("Failed to correct attendance", e),
    };
    if let Err(msg) = record.correct(&body) {
        return bad_request(msg);
    }

    let saved = state
        .db
        .save_attendance(&record)
        .and_then(|()| with_profiles(&state.db, vec![record]));
    match saved {
        Ok(mut views) => {
            log::info!("{} corrected attendance {}", caller.email, path.as_str());
            ok(views.pop())
        }
        Err(e) => internal_error("Failed to correct attendance", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{bearer, test_app, test_state, user_with_token};
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_clock_in_then_out() {
        let state = test_state();
        let (_, token) = user_with_token(&state, "emp@example.com", Role::Employee);
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/attendance/clock-out")
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/attendance/clock-in")
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["clock_out"].is_null());
        assert_eq!(body["data"]["work_date"], Utc::now().date_naive().to_string());

        // a second clock-in while the shift is open is refused
        let req = test::TestRequest::post()
            .uri("/api/attendance/clock-in")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Already clocked in");

        let req = test::TestRequest::post()
            .uri("/api/attendance/clock-out")
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["clock_out"].is_string());
        assert_eq!(body["data"]["duration_minutes"], 0);

        let req = test::TestRequest::get()
            .uri("/api/attendance/me")
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_simultaneous_clock_ins_open_one_shift() {
        let state = test_state();
        let (employee, token) = user_with_token(&state, "emp@example.com", Role::Employee);
        let app = test_app!(state);

        let clock_in = || {
            test::TestRequest::post()
                .uri("/api/attendance/clock-in")
                .insert_header(bearer(&token))
                .to_request()
        };
        let (first, second) = tokio::join!(
            test::call_service(&app, clock_in()),
            test::call_service(&app, clock_in())
        );
        let mut statuses = vec![first.status(), second.status()];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::BAD_REQUEST]);

        let open = Filter::new().eq("profile_id", Some(&employee.id)).is_null("clock_out");
        assert_eq!(state.db.list_attendance(&open, Page::default()).unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_my_attendance_pages_past_default() {
        let state = test_state();
        let (employee, token) = user_with_token(&state, "emp@example.com", Role::Employee);
        let first_day = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        for day in 0..55 {
            let start = first_day + chrono::Duration::days(day);
            let mut record = AttendanceRecord::open(&employee.id, start, 9, 15);
            record.close(start + chrono::Duration::hours(8));
            state.db.insert_attendance(&record).unwrap();
        }
        let app = test_app!(state);

        for (uri, expected) in [
            ("/api/attendance/me", 50),
            ("/api/attendance/me?limit=100", 55),
            ("/api/attendance/me?offset=50", 5),
            ("/api/attendance/me?from=2026-02-01&limit=100", 24),
        ] {
            let req = test::TestRequest::get().uri(uri).insert_header(bearer(&token)).to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["data"].as_array().unwrap().len(), expected, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_correction_and_summary() {
        let state = test_state();
        let (_, manager) = user_with_token(&state, "manager@example.com", Role::Manager);
        let (employee, employee_token) = user_with_token(&state, "emp@example.com", Role::Employee);

        let morning = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        let record = AttendanceRecord::open(&employee.id, morning, 9, 15);
        state.db.insert_attendance(&record).unwrap();
        let app = test_app!(state);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/admin/attendance/{}", record.id))
            .insert_header(bearer(&manager))
            .set_json(json!({ "clock_out": "2026-03-02T08:00:00Z" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/admin/attendance/{}", record.id))
            .insert_header(bearer(&manager))
            .set_json(json!({ "clock_out": "2026-03-02T17:30:00Z", "notes": "badge reader down" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["duration_minutes"], 480);
        assert_eq!(body["data"]["status"], "late");
        assert_eq!(body["data"]["profile"]["email"], "emp@example.com");

        let req = test::TestRequest::get()
            .uri("/api/admin/attendance/summary?from=2026-03-01&to=2026-03-31")
            .insert_header(bearer(&manager))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let totals = body["data"].as_array().unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0]["days"], 1);
        assert_eq!(totals[0]["total_minutes"], 480);
        assert_eq!(totals[0]["late_count"], 1);
        assert_eq!(totals[0]["profile"]["id"], employee.id.as_str());

        let req = test::TestRequest::get()
            .uri("/api/admin/attendance?status=late")
            .insert_header(bearer(&employee_token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_correcting_unknown_record_is_internal_error() {
        let state = test_state();
        let (_, manager) = user_with_token(&state, "manager@example.com", Role::Manager);
        let app = test_app!(state);

        let req = test::TestRequest::patch()
            .uri("/api/admin/attendance/missing")
            .insert_header(bearer(&manager))
            .set_json(json!({ "notes": "x" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
