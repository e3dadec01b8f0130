use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkline_core::models::{NewUser, User, UserPatch};
use parkline_core::repository::UserRepository;
use parkline_core::{CoreError, CoreResult};
use parkline_shared::Masked;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{map_db_error, storage};

pub struct StoreUserRepository {
    pool: SqlitePool,
}

impl StoreUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    full_name: String,
    phone: Option<String>,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            phone: row.phone,
            password_hash: Masked::new(row.password_hash),
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, full_name, phone, password_hash, is_admin, created_at";

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn create_user(&self, user: &NewUser) -> CoreResult<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, full_name, phone, password_hash, is_admin, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.password_hash.expose())
        .bind(user.is_admin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "username or email"))?;

        Ok(id)
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = ?1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(User::from))
    }

    async fn update_user(&self, id: Uuid, patch: &UserPatch) -> CoreResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE(?1, username),
                email = COALESCE(?2, email),
                full_name = COALESCE(?3, full_name),
                phone = COALESCE(?4, phone),
                password_hash = COALESCE(?5, password_hash)
            WHERE id = ?6
            "#,
        )
        .bind(&patch.username)
        .bind(&patch.email)
        .bind(&patch.full_name)
        .bind(&patch.phone)
        .bind(patch.password_hash.as_ref().map(|h| h.expose().clone()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "username or email"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_foreign_key_violation() {
                        return CoreError::Integrity(format!("user {} still has bookings", id));
                    }
                }
                storage(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
