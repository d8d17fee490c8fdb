//! Registration and login orchestration.
//!
//! The service owns no state of its own: every call looks the user up,
//! hashes or compares the password, and (for login) signs a token pair,
//! strictly in that order. Each collaborator is wrapped in [`Traced`] so
//! its operations show up as child spans of the service span.

use std::sync::Arc;

use tracing::{field, info, Span};

use crate::auth::{
    claims::{TokenKind, TokenSubject},
    dto::TokenPair,
    error::{AuthError, CredentialFailure},
    jwt::TokenIssuer,
    password::{HashError, PasswordHasher},
    repo::{StoreError, UserStore},
    repo_types::User,
};
use crate::telemetry::{observe, op_span, Traced};

pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new<S, H, T>(store: S, hasher: H, issuer: T) -> Self
    where
        S: UserStore + 'static,
        H: PasswordHasher + 'static,
        T: TokenIssuer + 'static,
    {
        Self {
            store: Arc::new(Traced(store)),
            hasher: Arc::new(Traced(hasher)),
            issuer: Arc::new(Traced(issuer)),
        }
    }

    /// Creates an account unless the email is already registered.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let span = op_span!("service.RegisterUser", email = %email, full_name = %full_name);
        observe(
            span,
            "User created successfully",
            self.register_steps(full_name, email, password),
        )
        .await
    }

    async fn register_steps(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        info!("registering user");

        // Only a definite "not found" lets registration continue; a failing
        // store must not be mistaken for a free email.
        match self.store.find_by_email(email).await {
            Ok(_) => return Err(AuthError::DuplicateAccount),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(AuthError::Persistence(e)),
        }

        let password_hash = self.hasher.hash(password).await.map_err(AuthError::Hashing)?;

        let user = User::new(full_name, email, password_hash);
        self.store
            .create(&user)
            .await
            .map_err(AuthError::Persistence)?;

        info!(user_id = %user.id, "user registered");
        Ok(())
    }

    /// Verifies credentials and issues a fresh access/refresh token pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let span = op_span!(
            "service.LoginUser",
            email = %email,
            user_id = field::Empty,
            full_name = field::Empty
        );
        observe(span, "Login successful", self.login_steps(email, password)).await
    }

    async fn login_steps(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        info!("logging in user");

        let user = match self.store.find_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                return Err(AuthError::InvalidCredentials(CredentialFailure::EmailNotFound))
            }
            Err(e) => return Err(AuthError::Persistence(e)),
        };

        let span = Span::current();
        span.record("user_id", field::display(user.id));
        span.record("full_name", user.full_name.as_str());

        match self.hasher.compare(&user.password_hash, password).await {
            Ok(()) => {}
            Err(HashError::Mismatch) => {
                return Err(AuthError::InvalidCredentials(
                    CredentialFailure::PasswordMismatch,
                ))
            }
            Err(e) => return Err(AuthError::Hashing(e)),
        }

        let subject = TokenSubject {
            user_id: user.id,
            full_name: user.full_name,
        };
        let access = self
            .issuer
            .generate_access_token(&subject)
            .map_err(|source| AuthError::TokenIssuance {
                kind: TokenKind::Access,
                source,
            })?;
        let refresh = self
            .issuer
            .generate_refresh_token(&subject)
            .map_err(|source| AuthError::TokenIssuance {
                kind: TokenKind::Refresh,
                source,
            })?;

        info!(
            user_id = %subject.user_id,
            access_expires_at = access.expires_at,
            refresh_expires_at = refresh.expires_at,
            "user logged in"
        );
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }
}
