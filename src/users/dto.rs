use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo::{AdminChanges, ProfileChanges, User};
use crate::auth::password;
use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration payload. The password is write-only by construction: no
/// response type below carries it.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    pub password: String,
}

impl CreateUserRequest {
    /// Normalize and validate before any write happens.
    pub fn validate(&mut self) -> Result<(), ApiError> {
        self.email = self.email.trim().to_lowercase();
        if !is_valid_email(&self.email) {
            return Err(ApiError::validation("email", "Enter a valid email address."));
        }
        if self.username.trim().is_empty() {
            return Err(ApiError::validation("username", "This field may not be blank."));
        }
        password::validate_strength("password", &self.password)
    }
}

/// Profile as the account owner sees it. Email is shown but never writable
/// on this path.
#[derive(Debug, Serialize)]
pub struct UserSelfView {
    pub email: String,
    pub username: String,
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
}

impl From<&User> for UserSelfView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            birth_date: user.birth_date,
        }
    }
}

/// Admin detail view: every field enumerated explicitly, password hash
/// excluded.
#[derive(Debug, Serialize)]
pub struct AdminUserView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: OffsetDateTime,
}

impl From<&User> for AdminUserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            birth_date: user.birth_date,
            is_active: user.is_active,
            is_staff: user.is_staff,
            created_at: user.created_at,
        }
    }
}

/// Listing projection: id and email only.
#[derive(Debug, Serialize, FromRow)]
pub struct UserListItem {
    pub id: Uuid,
    pub email: String,
}

/// Self-service profile update; any omitted field keeps its value. An
/// `email` key, if sent, is dropped here rather than applied.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
}

impl UpdateProfileRequest {
    pub fn into_changes(self) -> ProfileChanges {
        ProfileChanges {
            username: self.username,
            name: self.name,
            phone: self.phone,
            birth_date: self.birth_date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

impl AdminUpdateRequest {
    pub fn into_changes(mut self) -> Result<AdminChanges, ApiError> {
        if let Some(email) = self.email.as_mut() {
            *email = email.trim().to_lowercase();
            if !is_valid_email(email) {
                return Err(ApiError::validation("email", "Enter a valid email address."));
            }
        }
        Ok(AdminChanges {
            email: self.email,
            profile: ProfileChanges {
                username: self.username,
                name: self.name,
                phone: self.phone,
                birth_date: self.birth_date,
            },
            is_active: self.is_active,
            is_staff: self.is_staff,
        })
    }
}

/// Password-change confirmation payload.
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl SetPasswordRequest {
    /// Checks run in order: current password against the stored hash, new
    /// password strength, then reuse. Nothing is mutated on failure.
    pub fn validate(&self, caller: &User) -> Result<(), ApiError> {
        verify_current_password(&self.current_password, caller)?;
        password::validate_strength("new_password", &self.new_password)?;
        if self.new_password == self.current_password {
            return Err(ApiError::validation(
                "new_password",
                "New password is the same as old password.",
            ));
        }
        Ok(())
    }
}

/// Account-deactivation confirmation payload; no other writable field.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub current_password: String,
}

impl DeleteAccountRequest {
    pub fn validate(&self, caller: &User) -> Result<(), ApiError> {
        verify_current_password(&self.current_password, caller)
    }
}

fn verify_current_password(plain: &str, caller: &User) -> Result<(), ApiError> {
    let ok = password::verify_password(plain, &caller.password_hash)?;
    if !ok {
        return Err(ApiError::validation(
            "current_password",
            "Invalid current password.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_user(password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            username: "a".to_string(),
            name: "Ada".to_string(),
            phone: None,
            birth_date: None,
            password_hash: password::hash_password(password).unwrap(),
            is_active: true,
            is_staff: false,
            created_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn self_view_never_contains_a_password_field() {
        let user = sample_user("Str0ngPW!");
        let json = serde_json::to_value(UserSelfView::from(&user)).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.keys().all(|k| !k.contains("password")));
        assert_eq!(obj["email"], "a@x.com");
    }

    #[test]
    fn admin_view_enumerates_fields_without_the_hash() {
        let user = sample_user("Str0ngPW!");
        let json = serde_json::to_value(AdminUserView::from(&user)).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.keys().all(|k| !k.contains("password")));
        assert!(obj.contains_key("is_active"));
        assert!(obj.contains_key("is_staff"));
    }

    #[test]
    fn list_item_is_only_id_and_email() {
        let item = UserListItem {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn create_request_normalizes_and_validates_email() {
        let mut req = CreateUserRequest {
            email: "  A@X.Com ".to_string(),
            username: "a".to_string(),
            name: String::new(),
            phone: None,
            birth_date: None,
            password: "Str0ngPW!".to_string(),
        };
        req.validate().unwrap();
        assert_eq!(req.email, "a@x.com");

        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_rejects_weak_password() {
        let mut req = CreateUserRequest {
            email: "a@x.com".to_string(),
            username: "a".to_string(),
            name: String::new(),
            phone: None,
            birth_date: None,
            password: "1234".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn set_password_rejects_wrong_current_password() {
        let user = sample_user("Str0ngPW!");
        let req = SetPasswordRequest {
            current_password: "wrong".to_string(),
            new_password: "An0therPW!".to_string(),
        };
        let err = req.validate(&user).unwrap_err();
        assert!(err.to_string().contains("current_password"));
    }

    #[test]
    fn set_password_rejects_reuse_of_old_password() {
        let user = sample_user("Str0ngPW!");
        let req = SetPasswordRequest {
            current_password: "Str0ngPW!".to_string(),
            new_password: "Str0ngPW!".to_string(),
        };
        let err = req.validate(&user).unwrap_err();
        assert!(err.to_string().contains("same as old"));
    }

    #[test]
    fn set_password_accepts_a_valid_change() {
        let user = sample_user("Str0ngPW!");
        let req = SetPasswordRequest {
            current_password: "Str0ngPW!".to_string(),
            new_password: "An0therPW!".to_string(),
        };
        assert!(req.validate(&user).is_ok());
    }

    #[test]
    fn delete_request_requires_matching_password() {
        let user = sample_user("Str0ngPW!");
        let bad = DeleteAccountRequest {
            current_password: "nope".to_string(),
        };
        assert!(bad.validate(&user).is_err());
        let good = DeleteAccountRequest {
            current_password: "Str0ngPW!".to_string(),
        };
        assert!(good.validate(&user).is_ok());
    }
}
