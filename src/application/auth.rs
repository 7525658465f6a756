//! Authentication use case

use crate::domain::Session;
use crate::error::{DaybookError, Result};
use crate::infrastructure::IdentityProvider;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Service for signing users in and out
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        AuthService { provider }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = required_email(email)?;
        if password.is_empty() {
            return Err(DaybookError::Validation("Password is required".to_string()));
        }
        let session = self.provider.sign_in(email, password).await?;
        info!(user_id = %session.user_id, "signed in");
        Ok(session)
    }

    /// Create an account; the new user is signed in on success
    pub async fn register(&self, email: &str, password: &str) -> Result<Session> {
        let email = required_email(email)?;
        let session = self.provider.register(email, password).await?;
        info!(user_id = %session.user_id, "registered");
        Ok(session)
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        let email = required_email(email)?;
        self.provider.send_password_reset(email).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        debug!("signed out");
        Ok(())
    }

    pub async fn current_session(&self) -> Result<Option<Session>> {
        self.provider.current_session().await
    }

    /// The signed-in session, or `NotAuthenticated`
    pub async fn require_session(&self) -> Result<Session> {
        self.current_session()
            .await?
            .ok_or(DaybookError::NotAuthenticated)
    }

    /// Receive every session change, starting from the current state
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.provider.subscribe()
    }
}

fn required_email(email: &str) -> Result<&str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DaybookError::Validation("Email is required".to_string()));
    }
    Ok(email)
}
