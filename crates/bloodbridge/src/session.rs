//! Read-only view of the signed-in user, injected by the auth gateway.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::workflows::donors::{AccountStatus, UserRole};

pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_STATUS_HEADER: &str = "x-user-status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: Option<SessionUser>,
    pub role: Option<UserRole>,
    #[serde(default)]
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("user session is still loading")]
    Loading,
    #[error("no signed-in user")]
    Anonymous,
    #[error("account {email} is blocked; contact an administrator")]
    Blocked { email: String },
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: SessionUser, role: UserRole) -> Self {
        Self {
            user: Some(user),
            role: Some(role),
            is_loading: false,
        }
    }

    /// Session derived from gateway headers. A missing email means anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let Some(email) = header(USER_EMAIL_HEADER) else {
            return Self::anonymous();
        };

        let status = header(USER_STATUS_HEADER)
            .map(AccountStatus::from)
            .unwrap_or(AccountStatus::Active);
        let role = header(USER_ROLE_HEADER).map(UserRole::from);

        Self {
            user: Some(SessionUser {
                email,
                display_name: header(USER_NAME_HEADER).unwrap_or_default(),
                status,
            }),
            role,
            is_loading: false,
        }
    }

    pub fn role(&self) -> UserRole {
        self.role.unwrap_or_default()
    }

    /// The user allowed to act on requests: loaded, signed in and not blocked.
    pub fn requester(&self) -> Result<&SessionUser, SessionError> {
        if self.is_loading {
            return Err(SessionError::Loading);
        }

        let user = self.user.as_ref().ok_or(SessionError::Anonymous)?;
        if user.status == AccountStatus::Blocked {
            return Err(SessionError::Blocked {
                email: user.email.clone(),
            });
        }

        Ok(user)
    }
}
