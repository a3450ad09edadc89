// Bearer-token authentication and role checks.
// Handlers call `require_role` first and return its error response unchanged.

use actix_web::{HttpRequest, HttpResponse};

use crate::models::{Profile, Role};
use crate::response::{forbidden, internal_error, unauthorized};
use crate::AppState;

pub fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Resolve the caller's active profile from the bearer token
pub async fn authenticate(state: &AppState, req: &HttpRequest) -> Result<Profile, HttpResponse> {
    let token = extract_token(req).ok_or_else(|| unauthorized("No authorization token provided"))?;

    let profile_id = match state.verifier.verify(&token).await {
        Ok(Some(id)) => id,
        Ok(None) => return Err(unauthorized("Invalid or expired session")),
        Err(e) => return Err(internal_error("Session validation error", e)),
    };

    match state.db.get_profile(&profile_id) {
        Ok(Some(profile)) if profile.is_active => Ok(profile),
        Ok(Some(_)) => Err(unauthorized("Account is deactivated")),
        Ok(None) => {
            log::warn!("Token for {} has no matching profile", profile_id);
            Err(unauthorized("No profile for this session"))
        }
        Err(e) => Err(internal_error("Failed to load caller profile", e)),
    }
}

/// Authenticate, then compare the caller's role against `allowed`
pub async fn require_role(state: &AppState, req: &HttpRequest, allowed: &[Role]) -> Result<Profile, HttpResponse> {
    let profile = authenticate(state, req).await?;
    if !profile.has_role(allowed) {
        log::debug!("{} ({}) denied {} {}", profile.email, profile.role, req.method(), req.path());
        return Err(forbidden("Insufficient role"));
    }
    Ok(profile)
}
