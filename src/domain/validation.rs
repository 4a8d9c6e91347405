//! Client-side field rules shared by create and update.
//!
//! Rules run in a fixed order and the first violation wins. A field that is
//! `None` is not checked at all, which is how partial patches are validated.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{UserCreate, UserPatch};
use crate::error::ValidationError;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const PHONE_PATTERN: &str = r"^[0-9\s+-]+$";
const AVATAR_PATTERN: &str = r"(?i)^https?://";

type Compiled = Result<Regex, regex::Error>;

fn compiled(cell: &'static OnceLock<Compiled>, pattern: &str) -> Result<&'static Regex, ValidationError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| ValidationError::new(format!("bad pattern: {}", e)))
}

fn email_re() -> Result<&'static Regex, ValidationError> {
    static RE: OnceLock<Compiled> = OnceLock::new();
    compiled(&RE, EMAIL_PATTERN)
}

fn phone_re() -> Result<&'static Regex, ValidationError> {
    static RE: OnceLock<Compiled> = OnceLock::new();
    compiled(&RE, PHONE_PATTERN)
}

fn avatar_re() -> Result<&'static Regex, ValidationError> {
    static RE: OnceLock<Compiled> = OnceLock::new();
    compiled(&RE, AVATAR_PATTERN)
}

/// Borrowed view of the fields a rule set applies to.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fields<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub role: Option<&'a str>,
    pub status: Option<&'a str>,
    pub avatar: Option<&'a str>,
}

pub fn is_valid_email(email: &str) -> bool {
    email_re().is_ok_and(|re| re.is_match(email))
}

pub fn validate(fields: &Fields<'_>) -> Result<(), ValidationError> {
    if let Some(name) = fields.name {
        if name.trim().is_empty() {
            return Err(ValidationError::new("name required"));
        }
    }
    if let Some(email) = fields.email {
        if email.trim().is_empty() || !is_valid_email(email) {
            return Err(ValidationError::new("invalid email"));
        }
    }
    if let Some(phone) = fields.phone {
        if !phone.is_empty() && !phone_re()?.is_match(phone) {
            return Err(ValidationError::new("invalid phone"));
        }
    }
    if let Some(role) = fields.role {
        if role.trim().is_empty() {
            return Err(ValidationError::new("role required"));
        }
    }
    if let Some(status) = fields.status {
        if status.trim().is_empty() {
            return Err(ValidationError::new("status required"));
        }
    }
    if let Some(avatar) = fields.avatar {
        if !avatar.is_empty() && !avatar_re()?.is_match(avatar) {
            return Err(ValidationError::new("invalid avatar url"));
        }
    }
    Ok(())
}

pub fn validate_create(payload: &UserCreate) -> Result<(), ValidationError> {
    validate(&Fields {
        name: Some(&payload.name),
        email: Some(&payload.email),
        phone: payload.phone.as_deref(),
        role: Some(payload.role.as_str()),
        status: Some(payload.status.as_str()),
        avatar: payload.avatar.as_deref(),
    })
}

pub fn validate_patch(patch: &UserPatch) -> Result<(), ValidationError> {
    validate(&Fields {
        name: patch.name.as_deref(),
        email: patch.email.as_deref(),
        phone: patch.phone.as_deref(),
        role: patch.role.map(|r| r.as_str()),
        status: patch.status.map(|s| s.as_str()),
        avatar: patch.avatar.as_deref(),
    })
}
