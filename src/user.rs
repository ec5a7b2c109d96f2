use argon2::{
    Argon2, PasswordVerifier,
    password_hash::{PasswordHash, PasswordHasher, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::{Error, Result},
    session::{Role, SessionContext},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: String,
}

impl TryFrom<UserRow> for UserInfo {
    type Error = Error;
    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse().map_err(Error::Fatal)?,
        })
    }
}

pub async fn create_user(
    database: &SqlitePool,
    name: String,
    email: String,
    password: String,
    role: Role,
) -> Result<i64> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Fatal(anyhow::anyhow!("Failed to hash password: {}", e)))?
        .to_string();
    let id = sqlx::query("INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)")
        .bind(name)
        .bind(&email)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(database)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::EmailTaken(email.clone()),
            e => Error::Database(e),
        })?
        .last_insert_rowid();
    info!("created {} account {} for {}", role, id, email);
    Ok(id)
}

pub async fn get_user_info(database: &SqlitePool, id: i64) -> Result<UserInfo> {
    sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(database)
        .await?
        .ok_or(Error::not_found("user", id))?
        .try_into()
}

/// Check the password and return the context to store in the session.
pub async fn login(database: &SqlitePool, email: &str, password: &str) -> Result<SessionContext> {
    let row: Option<(i64, String, String)> =
        sqlx::query_as("SELECT id, password, role FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(database)
            .await?;
    let Some((id, hash, role)) = row else {
        return Err(Error::InvalidCredentials);
    };
    let parsed_hash = PasswordHash::new(&hash)
        .map_err(|e| Error::Fatal(anyhow::anyhow!("Failed to parse password hash: {}", e)))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| Error::InvalidCredentials)?;
    let role = role.parse().map_err(Error::Fatal)?;
    Ok(SessionContext::new(id, role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;

    #[tokio::test]
    async fn login_checks_password() {
        let database = connect_in_memory().await.unwrap();
        let id = create_user(
            &database,
            "Ada".into(),
            "ada@example.com".into(),
            "secret".into(),
            Role::Instructor,
        )
        .await
        .unwrap();

        let ctx = login(&database, "ada@example.com", "secret").await.unwrap();
        assert_eq!(ctx, SessionContext::new(id, Role::Instructor));

        assert!(matches!(
            login(&database, "ada@example.com", "wrong").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            login(&database, "bob@example.com", "secret").await,
            Err(Error::InvalidCredentials)
        ));

        let info = get_user_info(&database, id).await.unwrap();
        assert_eq!(info.name, "Ada");
        assert_eq!(info.role, Role::Instructor);
    }

    #[tokio::test]
    async fn email_can_only_register_once() {
        let database = connect_in_memory().await.unwrap();
        create_user(&database, "Ada".into(), "ada@example.com".into(), "a".into(), Role::Student)
            .await
            .unwrap();
        let err = create_user(&database, "Other".into(), "ada@example.com".into(), "b".into(), Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::EmailTaken(email) if email == "ada@example.com"));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
