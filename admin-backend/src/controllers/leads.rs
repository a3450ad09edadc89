use actix_web::{web, HttpRequest, Responder};

use super::ensure_profile;
use crate::db::{embed, Database, Filter, Page, Required};
use crate::middleware::session_auth::require_role;
use crate::models::{pipeline_summary, CreateLeadRequest, Lead, LeadView, ListLeadsQuery, UpdateLeadRequest, STAFF};
use crate::response::{bad_request, deleted, internal_error, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/leads")
            .route("", web::get().to(list_leads))
            .route("", web::post().to(create_lead))
            .route("/pipeline", web::get().to(pipeline))
            .route("/{id}", web::patch().to(update_lead))
            .route("/{id}", web::delete().to(delete_lead)),
    );
}

fn with_owners(db: &Database, leads: Vec<Lead>) -> rusqlite::Result<Vec<LeadView>> {
    let index = db.profiles_for(&leads, |l| [l.owner_id.as_deref()])?;
    Ok(leads
        .into_iter()
        .map(|lead| LeadView {
            owner: embed(&index, lead.owner_id.as_deref()),
            lead,
        })
        .collect())
}

async fn list_leads(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListLeadsQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let filter = Filter::new()
        .eq("stage", query.stage)
        .eq("owner_id", query.owner_id.as_deref())
        .search(&["company_name", "contact_name", "email"], query.search.as_deref());

    let leads = state
        .db
        .list_leads(&filter, Page::new(query.limit, query.offset))
        .and_then(|leads| with_owners(&state.db, leads));
    match leads {
        Ok(leads) => ok(leads),
        Err(e) => internal_error("Failed to list leads", e),
    }
}

async fn pipeline(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    match state.db.all_leads(&Filter::new()) {
        Ok(leads) => ok(pipeline_summary(&leads)),
        Err(e) => internal_error("Failed to load pipeline", e),
    }
}

async fn create_lead(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateLeadRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let lead = match Lead::from_request(&body) {
        Ok(lead) => lead,
        Err(msg) => return bad_request(msg),
    };
    if let Err(resp) = ensure_profile(&state.db, "owner_id", lead.owner_id.as_deref()) {
        return resp;
    }

    let saved = state.db.insert_lead(&lead).and_then(|()| with_owners(&state.db, vec![lead]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to create lead", e),
    }
}

async fn update_lead(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateLeadRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let mut lead = match state.db.get_lead(&path).required() {
        Ok(lead) => lead,
        Err(e) => return internal_error("Failed to update lead", e),
    };
    let previous_stage = lead.stage;
    if let Err(msg) = lead.apply(&body) {
        return bad_request(msg);
    }
    if let Err(resp) = ensure_profile(&state.db, "owner_id", lead.owner_id.as_deref()) {
        return resp;
    }
    if lead.stage != previous_stage {
        log::info!("Lead {} moved {} -> {}", lead.id, previous_stage, lead.stage);
    }

    let saved = state.db.save_lead(&lead).and_then(|()| with_owners(&state.db, vec![lead]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to update lead", e),
    }
}

async fn delete_lead(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let id = path.into_inner();
    match state.db.delete_lead(&id) {
        Ok(removed) => deleted(id, removed),
        Err(e) => internal_error("Failed to delete lead", e),
    }
}
