//! User — an operator of the dashboard. Loaded and edited through REST only.

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, ValidationError};
use crate::id::UserId;

/// Role granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

/// A user as returned by `GET /users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default, alias = "first_name")]
    pub firstname: String,
    #[serde(default, alias = "last_name")]
    pub lastname: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// `"Firstname Lastname"`, trimmed.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }
}

/// Payload for `POST /users` and `PUT /users/{id}`.
///
/// The password travels in clear to the REST collaborator, which owns
/// hashing. An empty password on update means "unchanged".
#[derive(Clone, PartialEq, Serialize)]
pub struct NewUser {
    #[serde(rename = "first_name")]
    pub firstname: String,
    #[serde(rename = "last_name")]
    pub lastname: String,
    pub email: String,
    pub role: UserRole,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl NewUser {
    /// Check domain invariants before the payload leaves the client.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when the first name or the email
    /// is empty.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.firstname.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyEmail.into());
        }
        Ok(())
    }
}
