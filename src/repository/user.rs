use sqlx::postgres::PgRow;
use sqlx::Row;
use std::sync::Arc;

use crate::models::{NewUserRecord, ProfilePatch, User};
use crate::{Executor, StoreError, StoreResult};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password_hash, role, address, phone, avatar_url";

pub struct UserRepository {
    executor: Executor,
}

impl UserRepository {
    pub fn new(executor: Executor) -> Arc<Self> {
        Arc::new(Self { executor })
    }

    /// Inserts a user; a taken email is reported as a validation error.
    pub async fn create(&self, record: &NewUserRecord) -> StoreResult<User> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query(&format!(
            "INSERT INTO users (first_name, last_name, email, password_hash, role, address, phone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        ))
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.role.as_str())
        .bind(&record.address)
        .bind(&record.phone)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::validation("email already registered")
            }
            other => StoreError::Database(other),
        })?;
        user_from_row(&row)
    }

    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut **tx)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Absent fields are kept; an empty optional field is stored as `NULL`.
    pub async fn update_profile(&self, id: i64, patch: &ProfilePatch) -> StoreResult<Option<User>> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                address = CASE WHEN $4 IS NULL THEN address ELSE NULLIF($4, '') END,
                phone = CASE WHEN $5 IS NULL THEN phone ELSE NULLIF($5, '') END,
                avatar_url = CASE WHEN $6 IS NULL THEN avatar_url ELSE NULLIF($6, '') END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(patch.address.as_deref())
        .bind(patch.phone.as_deref())
        .bind(patch.avatar_url.as_deref())
        .fetch_optional(&mut **tx)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse()?,
        address: row.try_get("address")?,
        phone: row.try_get("phone")?,
        avatar_url: row.try_get("avatar_url")?,
    })
}
