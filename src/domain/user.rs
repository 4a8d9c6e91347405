use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::validation;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
            Role::Guest => "Guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Admin" => Ok(Role::Admin),
            "User" => Ok(Role::User),
            "Guest" => Ok(Role::Guest),
            _ => Err(ValidationError::new("invalid role")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(Status::Active),
            "Inactive" => Ok(Status::Inactive),
            _ => Err(ValidationError::new("invalid status")),
        }
    }
}

/// A user record as held by the remote service.
///
/// `id` and `created_at` are assigned by the server and never sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// Payload for creating a new user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserCreate {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role, status: Status) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            role,
            status,
            avatar: None,
            bio: None,
        }
    }
}

/// Payload for updating an existing user. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl User {
    /// Shallow-merges the fields present in `patch`.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(avatar) = &patch.avatar {
            self.avatar = Some(avatar.clone());
        }
        if let Some(bio) = &patch.bio {
            self.bio = Some(bio.clone());
        }
    }
}

/// Raw add/edit form input. Every field is free text until validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub status: String,
    pub avatar: String,
    pub bio: String,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            role: user.role.to_string(),
            status: user.status.to_string(),
            avatar: user.avatar.clone().unwrap_or_default(),
            bio: user.bio.clone().unwrap_or_default(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl UserForm {
    fn checked(&self) -> Result<(Role, Status), ValidationError> {
        validation::validate(&validation::Fields {
            name: Some(&self.name),
            email: Some(&self.email),
            phone: Some(&self.phone),
            role: Some(&self.role),
            status: Some(&self.status),
            avatar: Some(&self.avatar),
        })?;
        Ok((self.role.parse()?, self.status.parse()?))
    }

    pub fn into_create(self) -> Result<UserCreate, ValidationError> {
        let (role, status) = self.checked()?;
        Ok(UserCreate {
            name: self.name.trim().to_string(),
            email: self.email,
            phone: non_empty(&self.phone),
            role,
            status,
            avatar: non_empty(&self.avatar),
            bio: non_empty(&self.bio),
        })
    }

    /// Full-form patch, as the edit dialog submits every field.
    pub fn into_patch(self) -> Result<UserPatch, ValidationError> {
        let (role, status) = self.checked()?;
        Ok(UserPatch {
            name: Some(self.name.trim().to_string()),
            email: Some(self.email),
            phone: Some(self.phone),
            role: Some(role),
            status: Some(status),
            avatar: Some(self.avatar),
            bio: Some(self.bio),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: "1".into(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            phone: None,
            role: Role::Admin,
            status: Status::Active,
            avatar: None,
            bio: Some("hello".into()),
            created_at: "2024-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn user_decodes_camel_case_and_missing_optionals() {
        let json = r#"{"id":"7","name":"Bob","email":"bob@x.io","role":"Guest","status":"Inactive","createdAt":"2024-05-01"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "7");
        assert_eq!(user.role, Role::Guest);
        assert_eq!(user.status, Status::Inactive);
        assert_eq!(user.created_at, "2024-05-01");
        assert!(user.phone.is_none());
    }

    #[test]
    fn create_payload_never_carries_server_fields() {
        let payload = UserCreate::new("Bob", "bob@x.io", Role::User, Status::Active);
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("createdAt").is_none());
        assert_eq!(value["role"], "User");
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let value = serde_json::to_value(UserPatch::status(Status::Inactive)).unwrap();
        assert_eq!(value, serde_json::json!({ "status": "Inactive" }));
    }

    #[test]
    fn apply_merges_shallowly() {
        let mut user = alice();
        user.apply(&UserPatch {
            name: Some("Alicia".into()),
            status: Some(Status::Inactive),
            ..UserPatch::default()
        });
        assert_eq!(user.name, "Alicia");
        assert_eq!(user.status, Status::Inactive);
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.bio.as_deref(), Some("hello"));
    }

    #[test]
    fn form_round_trips_through_create() {
        let form = UserForm {
            name: "  Carol ".into(),
            email: "carol@example.org".into(),
            phone: "+1 555-0100".into(),
            role: "User".into(),
            status: "Active".into(),
            avatar: "".into(),
            bio: "".into(),
        };
        let create = form.into_create().unwrap();
        assert_eq!(create.name, "Carol");
        assert_eq!(create.phone.as_deref(), Some("+1 555-0100"));
        assert!(create.avatar.is_none());
    }

    #[test]
    fn form_rejects_missing_role_and_unknown_status() {
        let mut form = UserForm::from(&alice());
        form.role = " ".into();
        assert_eq!(form.clone().into_patch().unwrap_err().0, "role required");

        form.role = "Admin".into();
        form.status = "Suspended".into();
        assert_eq!(form.into_patch().unwrap_err().0, "invalid status");
    }
}
