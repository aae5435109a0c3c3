//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use moodlog_common::{AppError, AppResult, IdGenerator};
use moodlog_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for signing up.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account. The account starts with a white mood and an
    /// empty emotion tally.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        if input.name.trim().is_empty() || input.email.trim().is_empty() || input.password.is_empty()
        {
            return Err(AppError::Validation("Missing details".to_string()));
        }
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(email),
            name: Set(input.name.trim().to_string()),
            password: Set(password_hash),
            token: Set(Some(self.id_gen.generate_token())),
            emotion_color: Set(user::DEFAULT_MOOD_COLOR.to_string()),
            emotion_counts: Set(json!([])),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.user_repo.create(model).await?;
        info!(user_id = %created.id, "Registered user");
        Ok(created)
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by email and password.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Sign in, returning the user and their current token.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<(user::Model, String)> {
        let user = self.authenticate(email, password).await?;
        let token = match &user.token {
            Some(token) => token.clone(),
            None => self.regenerate_token(&user.id).await?,
        };

        info!(user_id = %user.id, "Signed in");
        Ok((user, token))
    }

    /// Regenerate a user's authentication token.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        Ok(new_token)
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
