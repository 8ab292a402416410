use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::dto::UserListItem;

const USER_COLUMNS: &str = "id, email, username, name, phone, birth_date, \
     password_hash, is_active, is_staff, created_at";

/// User record in the database. Deliberately not `Serialize`: every response
/// goes through an explicit per-role view in `dto`, so the password hash can
/// never leak through model serialization.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
}

#[derive(Debug, Default)]
pub struct AdminChanges {
    pub email: Option<String>,
    pub profile: ProfileChanges,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

impl User {
    pub async fn create(
        db: &PgPool,
        email: &str,
        username: &str,
        name: &str,
        phone: Option<&str>,
        birth_date: Option<Date>,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, name, phone, birth_date, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(username)
        .bind(name)
        .bind(phone)
        .bind(birth_date)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Listing is an intentionally narrow projection.
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<UserListItem>> {
        let rows = sqlx::query_as::<_, UserListItem>(
            "SELECT id, email FROM users ORDER BY created_at ASC",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Apply profile-field changes; omitted fields keep their stored value.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username   = COALESCE($2, username),
                name       = COALESCE($3, name),
                phone      = COALESCE($4, phone),
                birth_date = COALESCE($5, birth_date)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.username.as_deref())
        .bind(changes.name.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.birth_date)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Admin-tier update; can also touch email, is_active and is_staff.
    pub async fn admin_update(
        db: &PgPool,
        id: Uuid,
        changes: &AdminChanges,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email      = COALESCE($2, email),
                username   = COALESCE($3, username),
                name       = COALESCE($4, name),
                phone      = COALESCE($5, phone),
                birth_date = COALESCE($6, birth_date),
                is_active  = COALESCE($7, is_active),
                is_staff   = COALESCE($8, is_staff)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email.as_deref())
        .bind(changes.profile.username.as_deref())
        .bind(changes.profile.name.as_deref())
        .bind(changes.profile.phone.as_deref())
        .bind(changes.profile.birth_date)
        .bind(changes.is_active)
        .bind(changes.is_staff)
        .fetch_one(db)
        .await
    }

    pub async fn set_password_hash(db: &PgPool, id: Uuid, hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Logical deletion: the record is retained with `is_active = false`.
    pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
