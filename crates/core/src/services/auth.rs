//! Authentication: login, signup and the bootstrap super admin.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use reelhouse_common::{AppError, AppResult, config::BootstrapAdminConfig};
use reelhouse_db::{
    entities::admin::AdminRole,
    repositories::{AdminRepository, UserRepository},
};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::principal::{Principal, Role};

const USER_EXISTS: &str = "User already exists";

/// Login form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signup form. `role = "admin"` asks for a content moderator account.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignupInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: Option<String>,
}

impl SignupInput {
    fn wants_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    admin_repo: AdminRepository,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, admin_repo: AdminRepository) -> Self {
        Self {
            user_repo,
            admin_repo,
        }
    }

    /// Resolve credentials to a principal.
    ///
    /// Members are looked up before admins. Every failure past the missing
    /// field check reports the same message.
    pub async fn login(&self, input: LoginInput) -> AppResult<Principal> {
        if input.email.is_empty() || input.password.is_empty() {
            return Err(AppError::BadRequest("Missing fields".to_string()));
        }

        if let Some(user) = self.user_repo.find_by_email(&input.email).await? {
            if !verify_password(&input.password, &user.password_hash)? {
                return Err(AppError::InvalidCredentials);
            }
            self.user_repo.touch_last_login(user.user_id).await?;
            info!(user_id = user.user_id, "User logged in");

            return Ok(Principal {
                id: user.user_id,
                name: user.name,
                role: Role::User,
                email: user.email,
            });
        }

        let admin = self
            .admin_repo
            .find_by_email(&input.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&input.password, &admin.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }
        info!(admin_id = admin.admin_id, "Admin logged in");

        Ok(Principal {
            id: admin.admin_id,
            name: admin.name,
            role: admin.role.into(),
            email: admin.email,
        })
    }

    /// Register a member, or a content moderator when a super admin asks.
    ///
    /// Emails are unique across members and admins.
    pub async fn signup(&self, input: SignupInput, caller: Option<&Principal>) -> AppResult<()> {
        if input.wants_admin() && !caller.is_some_and(|p| p.role.is_super_admin()) {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        input.validate()?;

        if self.email_taken(&input.email).await? {
            return Err(AppError::BadRequest(USER_EXISTS.to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let created = if input.wants_admin() {
            self.admin_repo
                .create(
                    &input.username,
                    &input.email,
                    &password_hash,
                    AdminRole::ContentModerator,
                )
                .await
                .map(|admin| info!(admin_id = admin.admin_id, "Admin account created"))
        } else {
            self.user_repo
                .create(&input.email, &input.username, &password_hash)
                .await
                .map(|user| info!(user_id = user.user_id, "User registered"))
        };

        created.map_err(|e| {
            if e.is_conflict() {
                AppError::BadRequest(USER_EXISTS.to_string())
            } else {
                e
            }
        })
    }

    /// Create the configured super admin unless its email is already used.
    pub async fn ensure_super_admin(&self, bootstrap: &BootstrapAdminConfig) -> AppResult<bool> {
        if self.admin_repo.find_by_email(&bootstrap.email).await?.is_some() {
            return Ok(false);
        }
        if self.user_repo.find_by_email(&bootstrap.email).await?.is_some() {
            warn!(email = %bootstrap.email, "Bootstrap admin email belongs to a member; skipping");
            return Ok(false);
        }

        let password_hash = hash_password(&bootstrap.password)?;
        let admin = self
            .admin_repo
            .create(
                &bootstrap.username,
                &bootstrap.email,
                &password_hash,
                AdminRole::SuperAdmin,
            )
            .await?;

        info!(admin_id = admin.admin_id, "Bootstrap super admin created");
        Ok(true)
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        Ok(self.user_repo.find_by_email(email).await?.is_some()
            || self.admin_repo.find_by_email(email).await?.is_some())
    }
}

/// Hash a password with Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash. A malformed hash never matches.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        warn!("Stored password hash is malformed");
        return Ok(false);
    };

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reelhouse_db::entities::{admin, user};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: i32, email: &str, hash: &str) -> user::Model {
        user::Model {
            user_id: id,
            email: email.to_string(),
            name: "Rosa".to_string(),
            password_hash: hash.to_string(),
            created_at: Utc::now().into(),
            last_login: None,
        }
    }

    fn create_test_admin(id: i32, email: &str, hash: &str) -> admin::Model {
        admin::Model {
            admin_id: id,
            username: "mod".to_string(),
            email: email.to_string(),
            password_hash: hash.to_string(),
            name: "mod".to_string(),
            role: AdminRole::ContentModerator,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> AuthService {
        let db = Arc::new(db.into_connection());
        AuthService::new(UserRepository::new(db.clone()), AdminRepository::new(db))
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("popcorn").unwrap();
        assert!(verify_password("popcorn", &hash).unwrap());
        assert!(!verify_password("butter", &hash).unwrap());
        assert!(!verify_password("popcorn", "not-a-hash").unwrap());
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let auth = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = auth
            .login(LoginInput {
                email: "rosa@example.com".to_string(),
                password: String::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing fields");
    }

    #[tokio::test]
    async fn test_member_login_stamps_last_login() {
        let hash = hash_password("popcorn").unwrap();
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(3, "rosa@example.com", &hash)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        let principal = auth
            .login(LoginInput {
                email: "rosa@example.com".to_string(),
                password: "popcorn".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(principal.id, 3);
        assert_eq!(principal.role, Role::User);
    }

    #[tokio::test]
    async fn test_admin_login_when_no_member_matches() {
        let hash = hash_password("popcorn").unwrap();
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[create_test_admin(1, "mod@example.com", &hash)]]),
        );

        let principal = auth
            .login(LoginInput {
                email: "mod@example.com".to_string(),
                password: "popcorn".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(principal.role, Role::ContentModerator);
        assert_eq!(principal.role.landing_page(), "/admin.html");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let hash = hash_password("popcorn").unwrap();
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(3, "rosa@example.com", &hash)]]),
        );

        let err = auth
            .login(LoginInput {
                email: "rosa@example.com".to_string(),
                password: "butter".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_admin_signup_requires_super_admin() {
        let auth = service(MockDatabase::new(DatabaseBackend::Postgres));
        let member = Principal {
            id: 3,
            name: "Rosa".to_string(),
            role: Role::User,
            email: "rosa@example.com".to_string(),
        };

        let input = SignupInput {
            username: "mod".to_string(),
            email: "mod@example.com".to_string(),
            password: "popcorn".to_string(),
            role: Some("admin".to_string()),
        };
        let err = auth.signup(input, Some(&member)).await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_signup_rejects_email_used_by_admin() {
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[create_test_admin(1, "mod@example.com", "x")]]),
        );

        let input = SignupInput {
            username: "rosa".to_string(),
            email: "mod@example.com".to_string(),
            password: "popcorn".to_string(),
            role: None,
        };
        let err = auth.signup(input, None).await.unwrap_err();

        assert_eq!(err.to_string(), USER_EXISTS);
    }

    #[tokio::test]
    async fn test_signup_validates_password_length() {
        let auth = service(MockDatabase::new(DatabaseBackend::Postgres));
        let input = SignupInput {
            username: "rosa".to_string(),
            email: "rosa@example.com".to_string(),
            password: "short".to_string(),
            role: None,
        };

        let err = auth.signup(input, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
