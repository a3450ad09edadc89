use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::non_blank;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Coarse-grained role stored on every profile
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Employee,
}

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const STAFF: &[Role] = &[Role::Admin, Role::Manager];
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Manager, Role::Employee];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }

    /// Apply a partial update; empty department / phone clear the field
    pub fn apply(&mut self, changes: &UpdateProfileRequest) -> Result<(), &'static str> {
        if let Some(full_name) = changes.full_name.as_deref() {
            self.full_name = non_blank(Some(full_name)).ok_or("full_name cannot be empty")?;
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(department) = changes.department.as_deref() {
            self.department = non_blank(Some(department));
        }
        if let Some(phone) = changes.phone.as_deref() {
            self.phone = non_blank(Some(phone));
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Slim profile embedded into related rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub phone: Option<String>,
}

impl CreateProfileRequest {
    /// Returns the normalised (email, full_name) pair
    pub fn required_fields(&self) -> Result<(String, String), &'static str> {
        let email = non_blank(self.email.as_deref())
            .ok_or("email is required")?
            .to_lowercase();
        let full_name = non_blank(self.full_name.as_deref()).ok_or("full_name is required")?;
        if !is_valid_email(&email) {
            return Err("email is not a valid address");
        }
        Ok((email, full_name))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListProfilesQuery {
    pub role: Option<Role>,
    pub search: Option<String>,
    pub active: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
