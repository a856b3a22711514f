//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use sqlx::PgPool;

use crate::domain::entity::{account::Account, login_attempt::LoginAttempt};
use crate::domain::repository::{AccountRepository, LoginAttemptRepository};
use crate::domain::value_object::{
    account_status::AccountStatus, authorities::Authorities, email::Email, role::Role,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete attempts older than `before`
    pub async fn prune_attempts(&self, before: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM login_attempts WHERE attempted_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(attempts_deleted = deleted, "Pruned login attempts");

        Ok(deleted)
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                email,
                password_hash,
                role,
                authorities,
                enabled,
                account_non_locked,
                account_non_expired,
                credentials_non_expired,
                created_at,
                updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }
}

// ============================================================================
// Login Attempt Repository Implementation
// ============================================================================

impl LoginAttemptRepository for PgAuthRepository {
    async fn append(&self, attempt: &LoginAttempt) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_attempts (
                identifier,
                attempted_at,
                success
            ) VALUES ($1, $2, $3)
            "#,
        )
        .bind(&attempt.identifier)
        .bind(attempt.attempted_at)
        .bind(attempt.success)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_recent(
        &self,
        identifier: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AuthResult<Vec<LoginAttempt>> {
        let rows = sqlx::query_as::<_, LoginAttemptRow>(
            r#"
            SELECT
                identifier,
                attempted_at,
                success
            FROM login_attempts
            WHERE identifier = $1
              AND attempted_at >= $2
            ORDER BY attempted_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(identifier)
        .bind(since)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoginAttemptRow::into_attempt).collect())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    email: String,
    password_hash: String,
    role: String,
    authorities: String,
    enabled: bool,
    account_non_locked: bool,
    account_non_expired: bool,
    credentials_non_expired: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password_hash: {}", e)))?;

        let role = Role::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role: {}", self.role)))?;

        Ok(Account {
            email: Email::from_db(self.email),
            password_hash,
            role,
            authorities: Authorities::parse(&self.authorities),
            status: AccountStatus {
                enabled: self.enabled,
                account_non_locked: self.account_non_locked,
                account_non_expired: self.account_non_expired,
                credentials_non_expired: self.credentials_non_expired,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LoginAttemptRow {
    identifier: String,
    attempted_at: DateTime<Utc>,
    success: bool,
}

impl LoginAttemptRow {
    fn into_attempt(self) -> LoginAttempt {
        LoginAttempt::new(self.identifier, self.success, self.attempted_at)
    }
}
