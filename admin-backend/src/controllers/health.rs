use actix_web::{web, HttpResponse, Responder};

use crate::response::{error, ok};
use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    match state.db.ping() {
        Ok(()) => ok(serde_json::json!({
            "status": "ok",
            "version": VERSION,
            "auth": state.verifier.name(),
        })),
        Err(e) => {
            log::error!("Health check failed: {}", e);
            error(
                actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                "Database unavailable",
            )
        }
    }
}

async fn get_version() -> HttpResponse {
    ok(serde_json::json!({
        "version": VERSION
    }))
}
