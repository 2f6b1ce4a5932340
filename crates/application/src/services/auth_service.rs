use std::sync::Arc;

use domain::{DomainError, FieldViolation, RepositoryError, User, UserEmail, UserId, Username};
use uuid::Uuid;

use crate::{
    clock::Clock, dto::UserDto, error::ApplicationError, password::PasswordHasher,
    repository::UserRepository,
};

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    /// Minimum accepted plaintext password length.
    pub min_password_len: usize,
}

pub struct AuthService {
    deps: AuthServiceDependencies,
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<UserDto, ApplicationError> {
        let mut violations: Vec<FieldViolation> = Vec::new();

        let email = UserEmail::parse(request.email)
            .map_err(|err| violations.extend(err.violations()))
            .ok();
        let name = Username::parse(request.name)
            .map_err(|err| violations.extend(err.violations()))
            .ok();
        if request.password.len() < self.deps.min_password_len {
            violations.push(FieldViolation::new(
                "password",
                format!(
                    "must be at least {} characters",
                    self.deps.min_password_len
                ),
            ));
        }

        let (Some(email), Some(name)) = (email, name) else {
            return Err(DomainError::validation(violations).into());
        };
        if !violations.is_empty() {
            return Err(DomainError::validation(violations).into());
        }

        if self
            .deps
            .user_repository
            .find_by_email(email.clone())
            .await?
            .is_some()
        {
            return Err(DomainError::UserAlreadyExists.into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let now = self.deps.clock.now();
        let user = User::register(
            UserId::from(Uuid::new_v4()),
            email,
            name,
            password_hash,
            now,
        );

        // A concurrent signup can still win the race past the lookup above;
        // the unique index surfaces as a conflict.
        let stored = self
            .deps
            .user_repository
            .create(user)
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict => ApplicationError::Domain(DomainError::UserAlreadyExists),
                other => other.into(),
            })?;

        Ok(UserDto::from(&stored))
    }

    /// Verify credentials and hand back the public account view. Unknown
    /// email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<UserDto, ApplicationError> {
        let Ok(email) = UserEmail::parse(request.email) else {
            return Err(ApplicationError::Authentication);
        };

        let user = self
            .deps
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok {
            return Err(ApplicationError::Authentication);
        }

        Ok(UserDto::from(&user))
    }
}
