//! Explicit sign-in context.
//!
//! Handlers never peek at ambient storage for a token or role. They load a
//! [`SessionContext`] from the server session once and hand it to
//! [`authorize`], which answers with the context or with a typed refusal that
//! carries the page the caller should be sent to.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use utoipa::ToSchema;

const CONTEXT_KEY: &str = "session_context";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub const ALL: &'static [Role] = &[Role::Student, Role::Instructor, Role::Admin];
    pub const STAFF: &'static [Role] = &[Role::Instructor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// Landing page for a signed-in user of this role.
    pub fn home(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Instructor => "/instructor",
            Role::Student => "/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            _ => anyhow::bail!("unknown role: {s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionContext {
    pub user_id: i64,
    pub role: Role,
}

impl SessionContext {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub async fn load(session: &Session) -> Result<Option<Self>, tower_sessions::session::Error> {
        session.get::<SessionContext>(CONTEXT_KEY).await
    }

    pub async fn store(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.cycle_id().await?;
        session.insert(CONTEXT_KEY, *self).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Role {role} may not access this resource")]
    Unauthorized { role: Role },
}

impl AccessError {
    pub fn redirect(&self) -> &'static str {
        match self {
            AccessError::Unauthenticated => "/auth/login",
            AccessError::Unauthorized { role } => role.home(),
        }
    }
}

/// Check a possibly absent context against the roles a resource admits.
pub fn authorize(
    context: Option<SessionContext>,
    allowed: &[Role],
) -> Result<SessionContext, AccessError> {
    let context = context.ok_or(AccessError::Unauthenticated)?;
    if allowed.contains(&context.role) {
        Ok(context)
    } else {
        Err(AccessError::Unauthorized { role: context.role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_context_is_unauthenticated() {
        let err = authorize(None, Role::ALL).unwrap_err();
        assert_eq!(err, AccessError::Unauthenticated);
        assert_eq!(err.redirect(), "/auth/login");
    }

    #[test]
    fn wrong_role_is_sent_home() {
        let student = SessionContext::new(7, Role::Student);
        let err = authorize(Some(student), Role::STAFF).unwrap_err();
        assert_eq!(err, AccessError::Unauthorized { role: Role::Student });
        assert_eq!(err.redirect(), "/dashboard");

        let admin = SessionContext::new(1, Role::Admin);
        let err = authorize(Some(admin), &[Role::Instructor]).unwrap_err();
        assert_eq!(err.redirect(), "/admin/dashboard");

        let instructor = SessionContext::new(2, Role::Instructor);
        let err = authorize(Some(instructor), &[Role::Student]).unwrap_err();
        assert_eq!(err.redirect(), "/instructor");
    }

    #[test]
    fn allowed_role_passes_through() {
        let ctx = SessionContext::new(3, Role::Instructor);
        assert_eq!(authorize(Some(ctx), Role::STAFF), Ok(ctx));
    }

    #[test]
    fn role_round_trips_through_its_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert!("guest".parse::<Role>().is_err());
    }
}
