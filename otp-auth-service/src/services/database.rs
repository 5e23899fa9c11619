//! PostgreSQL adapter for the user and OTP storage ports.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::store::{OtpStore, StoreError, UserStore};
use crate::models::{normalize_email, MaritalStatus, OtpRecord, User};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::ServiceUnavailable
            })?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    name: String,
    last_name: String,
    birth_day: NaiveDate,
    marital_status: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let marital_status = row
            .marital_status
            .parse::<MaritalStatus>()
            .map_err(StoreError::Corrupt)?;

        Ok(User {
            id: row.user_id,
            email: row.email,
            name: row.name,
            last_name: row.last_name,
            birth_day: row.birth_day,
            marital_status,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OtpRow {
    otp_id: Uuid,
    email: String,
    password: String,
    expires_utc: DateTime<Utc>,
    created_utc: DateTime<Utc>,
}

impl From<OtpRow> for OtpRecord {
    fn from(row: OtpRow) -> Self {
        OtpRecord {
            otp_id: row.otp_id,
            email: row.email,
            password: row.password,
            expires_utc: row.expires_utc,
            created_utc: row.created_utc,
        }
    }
}

const USER_COLUMNS: &str = "user_id, email, name, last_name, birth_day, marital_status";

fn map_write_error(e: sqlx::Error, what: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(what.to_string())
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl UserStore for Database {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, name, last_name, birth_day, marital_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                last_name = EXCLUDED.last_name,
                birth_day = EXCLUDED.birth_day,
                marital_status = EXCLUDED.marital_status,
                updated_utc = NOW()
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.last_name)
        .bind(user.birth_day)
        .bind(user.marital_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("email {}", user.email)))?;
        Ok(())
    }

    async fn delete_user_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY email",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}

#[async_trait]
impl OtpStore for Database {
    async fn find_otp_by_email(&self, email: &str) -> Result<Option<OtpRecord>, StoreError> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT otp_id, email, password, expires_utc, created_utc \
             FROM otp_codes WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OtpRecord::from))
    }

    async fn save_otp(&self, otp: &OtpRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (otp_id, email, password, expires_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE SET
                otp_id = EXCLUDED.otp_id,
                password = EXCLUDED.password,
                expires_utc = EXCLUDED.expires_utc,
                created_utc = EXCLUDED.created_utc
            "#,
        )
        .bind(otp.otp_id)
        .bind(normalize_email(&otp.email))
        .bind(&otp.password)
        .bind(otp.expires_utc)
        .bind(otp.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "otp id"))?;
        Ok(())
    }

    async fn delete_otp_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE email = $1")
            .bind(normalize_email(email))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_otps_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_utc < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use chrono::Duration;

    async fn database() -> Database {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/otp_auth_test".to_string()),
            max_connections: 2,
            min_connections: 1,
        };
        let pool = crate::db::create_pool(&config).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        Database::new(pool)
    }

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn user_round_trips_with_case_insensitive_lookup() {
        let db = database().await;
        let email = format!("Pg.{}@Example.com", Uuid::new_v4());
        let user = User::new(
            email.clone(),
            "Ann".to_string(),
            "Lee".to_string(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            MaritalStatus::CommonLaw,
        );
        db.save_user(&user).await.unwrap();

        let found = db.find_user_by_email(&email.to_uppercase()).await.unwrap();
        assert_eq!(found, Some(user.clone()));

        let duplicate = User::new(
            email.to_lowercase(),
            "Bob".to_string(),
            "Lee".to_string(),
            NaiveDate::from_ymd_opt(1991, 1, 1).unwrap(),
            MaritalStatus::Single,
        );
        assert!(matches!(db.save_user(&duplicate).await, Err(StoreError::Conflict(_))));

        assert!(db.delete_user_by_id(user.id).await.unwrap());
        assert!(!db.delete_user_by_id(user.id).await.unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn otp_upsert_keeps_one_record_per_email() {
        let db = database().await;
        let email = format!("otp.{}@example.com", Uuid::new_v4());
        let now = Utc::now();

        let first = OtpRecord::new(&email, "first".to_string(), now, Duration::minutes(5));
        let second = OtpRecord::new(&email, "second".to_string(), now, Duration::minutes(5));
        db.save_otp(&first).await.unwrap();
        db.save_otp(&second).await.unwrap();

        let found = db.find_otp_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.password, "second");

        assert!(db.delete_otp_by_email(&email).await.unwrap());
        assert!(db.find_otp_by_email(&email).await.unwrap().is_none());
    }
}
