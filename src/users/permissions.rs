use crate::error::ApiError;

use super::repo::User;

/// Every operation the service exposes, named for permission resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    List,
    Retrieve,
    Update,
    Destroy,
    Me,
    SetPassword,
}

/// Who may invoke an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    AllowAny,
    AdminOnly,
    CurrentUserOrAdmin,
}

/// The single permission table, resolved once per request before any data
/// is read.
pub const fn access_for(action: Action) -> Access {
    match action {
        Action::Create => Access::AllowAny,
        Action::Me | Action::SetPassword => Access::CurrentUserOrAdmin,
        Action::List | Action::Retrieve | Action::Update | Action::Destroy => Access::AdminOnly,
    }
}

/// Authorize `caller` (None for anonymous) against the table. Anonymous
/// callers failing a check get 401; authenticated non-admins get 403.
pub fn require(action: Action, caller: Option<&User>) -> Result<(), ApiError> {
    match access_for(action) {
        Access::AllowAny => Ok(()),
        Access::CurrentUserOrAdmin => match caller {
            Some(_) => Ok(()),
            None => Err(authentication_required()),
        },
        Access::AdminOnly => match caller {
            Some(user) if user.is_staff => Ok(()),
            Some(_) => Err(ApiError::Forbidden),
            None => Err(authentication_required()),
        },
    }
}

fn authentication_required() -> ApiError {
    ApiError::unauthorized("Authentication credentials were not provided.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn user(is_staff: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "u@x.com".to_string(),
            username: "u".to_string(),
            name: String::new(),
            phone: None,
            birth_date: None,
            password_hash: "hash".to_string(),
            is_active: true,
            is_staff,
            created_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn registration_is_open_to_anonymous_callers() {
        assert!(require(Action::Create, None).is_ok());
    }

    #[test]
    fn listing_is_admin_only() {
        let member = user(false);
        let admin = user(true);
        assert!(matches!(
            require(Action::List, None),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            require(Action::List, Some(&member)),
            Err(ApiError::Forbidden)
        ));
        assert!(require(Action::List, Some(&admin)).is_ok());
    }

    #[test]
    fn detail_actions_are_admin_only() {
        let member = user(false);
        for action in [Action::Retrieve, Action::Update, Action::Destroy] {
            assert!(matches!(
                require(action, Some(&member)),
                Err(ApiError::Forbidden)
            ));
        }
    }

    #[test]
    fn self_service_actions_allow_any_authenticated_user() {
        let member = user(false);
        let admin = user(true);
        for action in [Action::Me, Action::SetPassword] {
            assert!(require(action, Some(&member)).is_ok());
            assert!(require(action, Some(&admin)).is_ok());
            assert!(require(action, None).is_err());
        }
    }
}
