//! Minimal user accounts.

use crate::patch::{Patch, PatchSet};
use crate::validation::{Report, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const USER_FIELDS: &[&str] = &["username", "name", "email", "password_hash"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AppUser {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Body for both create and full replace.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Partial update. `null` means "no change" on every field. The `given_*` aliases are
/// accepted for older clients.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UserUpdate {
    #[serde(default, alias = "given_username")]
    pub username: Patch<String>,
    #[serde(default, alias = "given_name")]
    pub name: Patch<String>,
    #[serde(default, alias = "given_email")]
    pub email: Patch<String>,
    #[serde(default, alias = "given_password")]
    pub password: Patch<String>,
}

impl Validate for UserCreate {
    const ENTITY: &'static str = "User";

    fn check(&self, r: &mut Report) {
        r.text("username", self.username.trim(), 1, 32);
        r.text("name", &self.name, 1, 64);
        r.text("email", &self.email, 1, 255);
        r.email("email", &self.email);
        r.text("password", &self.password, 1, 255);
    }
}

impl Validate for UserUpdate {
    const ENTITY: &'static str = "UserUpdate";

    fn check(&self, r: &mut Report) {
        if let Some(u) = self.username.as_value() {
            r.text("username", u.trim(), 1, 32);
        }
        if let Some(n) = self.name.as_value() {
            r.text("name", n, 1, 64);
        }
        if let Some(e) = self.email.as_value() {
            r.text("email", e, 1, 255);
            r.email("email", e);
        }
        if let Some(p) = self.password.as_value() {
            r.text("password", p, 1, 255);
        }
    }
}

impl UserUpdate {
    pub fn patch_set(&self) -> PatchSet {
        let mut set = PatchSet::new();
        set.insert("username".into(), self.username.clone().null_as_unset().into_json());
        set.insert("name".into(), self.name.clone().null_as_unset().into_json());
        set.insert("email".into(), self.email.clone().null_as_unset().into_json());
        set.insert("password_hash".into(), self.password.clone().null_as_unset().into_json());
        set
    }
}

/// Usernames and emails are stored lower-cased and trimmed.
pub fn normalize_user_field(field: &str, value: serde_json::Value) -> Result<serde_json::Value, String> {
    match (field, value) {
        ("username" | "email", serde_json::Value::String(s)) => Ok(serde_json::Value::String(s.trim().to_lowercase())),
        (_, v) => Ok(v),
    }
}
