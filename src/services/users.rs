use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{hash_password, user, verify_password, AuthError, AuthService, IssuedToken};
use crate::db::DbPool;
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct LoginCommand {
    /// Username or email
    pub login: String,
    pub password: String,
}

/// A user together with a freshly issued token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: user::Model,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, auth: Arc<AuthService>) -> Self {
        Self { db_pool, auth }
    }

    #[instrument(skip(self, command), fields(username = %command.username))]
    pub async fn register(&self, command: RegisterCommand) -> Result<Session, ServiceError> {
        let username = command.username.trim().to_string();
        let email = command.email.trim().to_lowercase();
        let db = self.db_pool.as_ref();

        let taken = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username.clone()))
                    .add(user::Column::Email.eq(email.clone())),
            )
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if let Some(existing) = taken {
            let field = if existing.username == username {
                "username"
            } else {
                "email"
            };
            return Err(ServiceError::Conflict(format!("{} is already registered", field)));
        }

        let password_hash = hash_password(&command.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let created = user::ActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            full_name: Set(command.full_name.trim().to_string()),
            last_login: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        let token = self.auth.generate_token(&created)?;
        counter!("auth.registrations", 1);
        info!(user_id = %created.id, "user registered");
        Ok(Session {
            user: created,
            token,
        })
    }

    #[instrument(skip(self, command), fields(login = %command.login))]
    pub async fn login(&self, command: LoginCommand) -> Result<Session, ServiceError> {
        let login = command.login.trim();
        let db = self.db_pool.as_ref();

        let found = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(login))
                    .add(user::Column::Email.eq(login.to_lowercase())),
            )
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        let Some(found) = found.filter(|u| verify_password(&command.password, &u.password_hash))
        else {
            counter!("auth.login_failures", 1);
            warn!("login rejected");
            return Err(AuthError::InvalidCredentials.into());
        };

        let mut active = found.into_active_model();
        active.last_login = Set(Some(Utc::now()));
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        let token = self.auth.generate_token(&updated)?;
        counter!("auth.logins", 1);
        info!(user_id = %updated.id, "user logged in");
        Ok(Session {
            user: updated,
            token,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.auth.revoke_token(token).await?;
        info!("token revoked");
        Ok(())
    }
}
