use actix_web::{web, HttpRequest, Responder};

use crate::db::{Filter, Page, Required};
use crate::middleware::session_auth::require_role;
use crate::models::{CreateProfileRequest, ListProfilesQuery, UpdateProfileRequest, ADMIN_ONLY, STAFF};
use crate::response::{bad_request, deleted, internal_error, not_found, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::patch().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}

async fn list_users(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListProfilesQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let filter = Filter::new()
        .eq("role", query.role)
        .eq_bool("is_active", query.active)
        .search(&["email", "full_name"], query.search.as_deref());

    match state.db.list_profiles(&filter, Page::new(query.limit, query.offset)) {
        Ok(profiles) => ok(profiles),
        Err(e) => internal_error("Failed to list users", e),
    }
}

async fn get_user(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    match state.db.get_profile(&path) {
        Ok(Some(profile)) => ok(profile),
        Ok(None) => not_found("User not found"),
        Err(e) => internal_error("Failed to load user", e),
    }
}

async fn create_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateProfileRequest>,
) -> impl Responder {
    let admin = match require_role(&state, &req, ADMIN_ONLY).await {
        Ok(profile) => profile,
        Err(resp) => return resp,
    };

    let (email, full_name) = match body.required_fields() {
        Ok(fields) => fields,
        Err(msg) => return bad_request(msg),
    };

    match state.db.create_profile(
        &email,
        &full_name,
        body.role.unwrap_or_default(),
        body.department.as_deref().map(str::trim).filter(|d| !d.is_empty()),
        body.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()),
    ) {
        Ok(profile) => {
            log::info!("{} created user {} ({})", admin.email, profile.email, profile.role);
            ok(profile)
        }
        Err(e) => internal_error("Failed to create user", e),
    }
}

async fn update_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let mut profile = match state.db.get_profile(&path).required() {
        Ok(profile) => profile,
        Err(e) => return internal_error("Failed to update user", e),
    };
    if let Err(msg) = profile.apply(&body) {
        return bad_request(msg);
    }

    match state.db.save_profile(&profile) {
        Ok(()) => ok(profile),
        Err(e) => internal_error("Failed to update user", e),
    }
}

async fn delete_user(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    let admin = match require_role(&state, &req, ADMIN_ONLY).await {
        Ok(profile) => profile,
        Err(resp) => return resp,
    };
    let id = path.into_inner();
    if id == admin.id {
        return bad_request("You cannot delete your own account");
    }

    match state.db.delete_profile(&id) {
        Ok(removed) => {
            if removed {
                log::info!("{} deleted user {}", admin.email, id);
            }
            deleted(id, removed)
        }
        Err(e) => internal_error("Failed to delete user", e),
    }
}
