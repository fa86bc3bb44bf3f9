// db/userdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{User, UserRole};

#[async_trait]
pub trait UserExt: Send + Sync {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, Error>;

    async fn email_exists(&self, email: &str) -> Result<bool, Error>;

    async fn save_user(
        &self,
        name: String,
        email: String,
        password: String,
        role: UserRole,
        verification_token: String,
    ) -> Result<User, Error>;

    async fn mark_user_verified(&self, token: &str) -> Result<Option<User>, Error>;

    async fn update_user_password(&self, user_id: Uuid, new_password: String)
        -> Result<User, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password, role, verified, verification_token, created_at, updated_at
                FROM users WHERE id = $1
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password, role, verified, verification_token, created_at, updated_at
                FROM users WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(token) = token {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password, role, verified, verification_token, created_at, updated_at
                FROM users WHERE verification_token = $1
                "#,
            )
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn save_user(
        &self,
        name: String,
        email: String,
        password: String,
        role: UserRole,
        verification_token: String,
    ) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, role, verification_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password, role, verified, verification_token, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password)
        .bind(role)
        .bind(verification_token)
        .fetch_one(&self.pool)
        .await
    }

    async fn mark_user_verified(&self, token: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verified = TRUE, verification_token = NULL, updated_at = NOW()
            WHERE verification_token = $1
            RETURNING id, name, email, password, role, verified, verification_token, created_at, updated_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        new_password: String,
    ) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, password, role, verified, verification_token, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(new_password)
        .fetch_one(&self.pool)
        .await
    }
}
