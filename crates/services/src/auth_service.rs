use std::sync::Arc;

use learnaid_core::model::{AuthResponse, LoginForm, SignupForm, User};
use storage::repository::{SessionKey, SessionRepository};

use crate::error::AuthError;
use crate::remote::AuthApi;

/// Signed-in user as restored from session storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Login, signup and the persisted session.
#[derive(Clone)]
pub struct AuthService {
    auth: Arc<dyn AuthApi>,
    session: Arc<dyn SessionRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthApi>, session: Arc<dyn SessionRepository>) -> Self {
        Self { auth, session }
    }

    /// Validates the form locally, then signs in and stores the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` without any network call when the form
    /// is invalid, `AuthError::Api` when the backend rejects the credentials.
    pub async fn login(&self, form: &LoginForm) -> Result<AuthSession, AuthError> {
        form.validate()?;
        let response = self.auth.login(form).await?;
        self.store(response).await
    }

    /// Validates the form locally, then creates the account and stores the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` without any network call when the form
    /// is invalid, `AuthError::Api` when the backend refuses the signup.
    pub async fn signup(&self, form: &SignupForm) -> Result<AuthSession, AuthError> {
        form.validate()?;
        let response = self.auth.signup(form).await?;
        self.store(response).await
    }

    async fn store(&self, response: AuthResponse) -> Result<AuthSession, AuthError> {
        let user_json = serde_json::to_string(&response.user)?;
        self.session
            .set(SessionKey::AuthToken, &response.token)
            .await?;
        if let Some(refresh) = &response.refresh_token {
            self.session.set(SessionKey::RefreshToken, refresh).await?;
        }
        self.session.set(SessionKey::User, &user_json).await?;
        tracing::info!(user_id = %response.user.id, "signed in");
        Ok(AuthSession {
            user: response.user,
            token: response.token,
        })
    }

    /// Reads the stored session at startup. `None` unless both token and user are present.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` on read failure and `AuthError::CorruptUser`
    /// if the stored user record cannot be decoded.
    pub async fn restore_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let token = self.session.get(SessionKey::AuthToken).await?;
        let user = self.session.get(SessionKey::User).await?;
        let (Some(token), Some(user)) = (token, user) else {
            return Ok(None);
        };
        let user: User = serde_json::from_str(&user)?;
        tracing::debug!(user_id = %user.id, "session restored");
        Ok(Some(AuthSession { user, token }))
    }

    /// Clears every stored session key, whether or not anyone was signed in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the clear fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.session.clear_all().await?;
        tracing::info!("signed out");
        Ok(())
    }
}
