pub mod attendance;
pub mod auth;
pub mod billing;
pub mod dashboard;
pub mod health;
pub mod leads;
pub mod payroll;
pub mod tasks;
pub mod tickets;
pub mod users;
pub mod verifications;

use actix_web::{web, HttpResponse};

use crate::db::Database;
use crate::response::{bad_request, internal_error};

/// Register every API route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::config)
        .configure(auth::config)
        .configure(dashboard::config)
        .configure(users::config)
        .configure(tasks::config)
        .configure(leads::config)
        .configure(payroll::config)
        .configure(attendance::config)
        .configure(tickets::config)
        .configure(verifications::config)
        .configure(billing::config);
}

/// A foreign key supplied in a request body must name an existing profile
pub fn ensure_profile(db: &Database, field: &str, id: Option<&str>) -> Result<(), HttpResponse> {
    let id = match id {
        Some(id) => id,
        None => return Ok(()),
    };
    match db.get_profile(id) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(bad_request(format!("{} does not match any user", field))),
        Err(e) => Err(internal_error("Failed to look up profile", e)),
    }
}
