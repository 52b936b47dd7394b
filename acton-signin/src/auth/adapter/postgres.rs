//! Postgres adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use super::{
    normalize_email, Adapter, AdapterAccount, AdapterResult, AdapterSession, AdapterUser, NewUser,
};

const SCHEMA: &str = include_str!("../../../migrations/0001_auth_tables.sql");

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: Option<String>,
    email: Option<String>,
    email_verified: Option<DateTime<Utc>>,
    image: Option<String>,
}

impl From<UserRow> for AdapterUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            email_verified: row.email_verified,
            image: row.image,
        }
    }
}

#[derive(Debug, FromRow)]
struct SessionUserRow {
    session_token: String,
    expires: DateTime<Utc>,
    user_id: String,
    name: Option<String>,
    email: Option<String>,
    email_verified: Option<DateTime<Utc>>,
    image: Option<String>,
}

#[derive(Debug, FromRow)]
struct SessionRow {
    session_token: String,
    user_id: String,
    expires: DateTime<Utc>,
}

impl From<SessionRow> for AdapterSession {
    fn from(row: SessionRow) -> Self {
        Self {
            session_token: row.session_token,
            user_id: row.user_id,
            expires: row.expires,
        }
    }
}

/// Adapter storing users, accounts and sessions in Postgres
#[derive(Debug, Clone)]
pub struct PgAdapter {
    pool: PgPool,
}

impl PgAdapter {
    /// Wrap an existing pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` with a pool of `max_connections`
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    pub async fn connect(url: &str, max_connections: u32) -> AdapterResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub async fn migrate(&self) -> AdapterResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Adapter for PgAdapter {
    async fn create_user(&self, user: NewUser) -> AdapterResult<AdapterUser> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (id, name, email, email_verified, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, email_verified, image
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user.name)
        .bind(user.email.as_deref().map(normalize_email))
        .bind(user.email_verified)
        .bind(&user.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_user(&self, id: &str) -> AdapterResult<Option<AdapterUser>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, email_verified, image FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<AdapterUser>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, email_verified, image FROM users WHERE lower(email) = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<AdapterUser>> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT u.id, u.name, u.email, u.email_verified, u.image
            FROM users u
            JOIN accounts a ON a.user_id = u.id
            WHERE a.provider = $1 AND a.provider_account_id = $2
            ",
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update_user(&self, user: AdapterUser) -> AdapterResult<AdapterUser> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET name = $2, email = $3, email_verified = $4, image = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, email_verified, image
            ",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(user.email.as_deref().map(normalize_email))
        .bind(user.email_verified)
        .bind(&user.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn link_account(&self, account: AdapterAccount) -> AdapterResult<()> {
        sqlx::query(
            r"
            INSERT INTO accounts
                (user_id, provider, provider_account_id, access_token, refresh_token, expires_at, scope)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (provider, provider_account_id)
            DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, accounts.refresh_token),
                expires_at = EXCLUDED.expires_at,
                scope = EXCLUDED.scope,
                updated_at = NOW()
            ",
        )
        .bind(&account.user_id)
        .bind(&account.provider)
        .bind(&account.provider_account_id)
        .bind(&account.access_token)
        .bind(&account.refresh_token)
        .bind(account.expires_at)
        .bind(&account.scope)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_session(&self, session: AdapterSession) -> AdapterResult<AdapterSession> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            INSERT INTO sessions (session_token, user_id, expires)
            VALUES ($1, $2, $3)
            RETURNING session_token, user_id, expires
            ",
        )
        .bind(&session.session_token)
        .bind(&session.user_id)
        .bind(session.expires)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> AdapterResult<Option<(AdapterSession, AdapterUser)>> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r"
            SELECT s.session_token, s.expires, u.id AS user_id,
                   u.name, u.email, u.email_verified, u.image
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.session_token = $1
            ",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            (
                AdapterSession {
                    session_token: row.session_token,
                    user_id: row.user_id.clone(),
                    expires: row.expires,
                },
                AdapterUser {
                    id: row.user_id,
                    name: row.name,
                    email: row.email,
                    email_verified: row.email_verified,
                    image: row.image,
                },
            )
        }))
    }

    async fn update_session(
        &self,
        session: AdapterSession,
    ) -> AdapterResult<Option<AdapterSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            UPDATE sessions SET expires = $2
            WHERE session_token = $1
            RETURNING session_token, user_id, expires
            ",
        )
        .bind(&session.session_token)
        .bind(session.expires)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_session(&self, session_token: &str) -> AdapterResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_token = $1")
            .bind(session_token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
