use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{Datelike, NaiveDate};

use super::ensure_profile;
use crate::db::{columns, embed, Database, Filter, Page, Required};
use crate::middleware::session_auth::require_role;
use crate::models::{
    parse_period, payroll_summary, CreatePayrollRequest, ListPayrollQuery, PayrollRecord, PayrollSummaryQuery,
    PayrollView, UpdatePayrollRequest, ADMIN_ONLY,
};
use crate::response::{bad_request, deleted, internal_error, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/payroll")
            .route("", web::get().to(list_payroll))
            .route("", web::post().to(create_payroll))
            .route("/summary", web::get().to(summary))
            .route("/{id}", web::patch().to(update_payroll))
            .route("/{id}", web::delete().to(delete_payroll)),
    );
}

/// First and last day of a `YYYY-MM` period
fn month_bounds(period: &str) -> Option<(NaiveDate, NaiveDate)> {
    let first = parse_period(period)?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Records whose period starts inside the requested month
fn period_filter(filter: Filter, period: Option<&str>) -> Result<Filter, HttpResponse> {
    let period = match period.map(str::trim).filter(|p| !p.is_empty()) {
        Some(period) => period,
        None => return Ok(filter),
    };
    let (first, last) = month_bounds(period).ok_or_else(|| bad_request("period must be formatted as YYYY-MM"))?;
    Ok(filter
        .gte("period_start", Some(columns::day(&first)))
        .lte("period_start", Some(columns::day(&last))))
}

fn with_employees(db: &Database, records: Vec<PayrollRecord>) -> rusqlite::Result<Vec<PayrollView>> {
    let index = db.profiles_for(&records, |r| [Some(r.employee_id.as_str())])?;
    Ok(records
        .into_iter()
        .map(|record| PayrollView {
            employee: embed(&index, Some(&record.employee_id)),
            record,
        })
        .collect())
}

async fn list_payroll(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListPayrollQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let filter = Filter::new()
        .eq("employee_id", query.employee_id.as_deref())
        .eq("status", query.status);
    let filter = match period_filter(filter, query.period.as_deref()) {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };

    let records = state
        .db
        .list_payroll(&filter, Page::new(query.limit, query.offset))
        .and_then(|records| with_employees(&state.db, records));
    match records {
        Ok(records) => ok(records),
        Err(e) => internal_error("Failed to list payroll", e),
    }
}

async fn summary(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PayrollSummaryQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let filter = match period_filter(Filter::new(), query.period.as_deref()) {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };

    match state.db.all_payroll(&filter) {
        Ok(records) => ok(payroll_summary(&records)),
        Err(e) => internal_error("Failed to summarise payroll", e),
    }
}

async fn create_payroll(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreatePayrollRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let record = match PayrollRecord::from_request(&body) {
        Ok(record) => record,
        Err(msg) => return bad_request(msg),
    };
    if let Err(resp) = ensure_profile(&state.db, "employee_id", Some(&record.employee_id)) {
        return resp;
    }

    let saved = state
        .db
        .insert_payroll(&record)
        .and_then(|()| with_employees(&state.db, vec![record]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to create payroll record", e),
    }
}

async fn update_payroll(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdatePayrollRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let mut record = match state.db.get_payroll(&path).required() {
        Ok(record) => record,
        Err(e) => return internal_error("Failed to update payroll record", e),
    };
    if let Err(msg) = record.apply(&body) {
        return bad_request(msg);
    }

    let saved = state
        .db
        .save_payroll(&record)
        .and_then(|()| with_employees(&state.db, vec![record]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to update payroll record", e),
    }
}

async fn delete_payroll(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let id = path.into_inner();
    match state.db.delete_payroll(&id) {
        Ok(removed) => deleted(id, removed),
        Err(e) => internal_error("Failed to delete payroll record", e),
    }
}
