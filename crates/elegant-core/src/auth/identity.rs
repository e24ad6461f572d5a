//! Who is signed in right now.

use std::sync::{Arc, PoisonError, RwLock};

use super::AuthUser;

/// Answers "is a user currently authenticated, and with which identity".
pub trait AuthProvider: Send + Sync {
    /// Identifier of the signed-in user, or `None` when anonymous
    fn current_user(&self) -> Option<String>;
}

/// Shared, swappable sign-in state.
///
/// Clones observe the same user, so the application root can sign in or out
/// while the store keeps its handle.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    user: Arc<RwLock<Option<AuthUser>>>,
}

impl AuthState {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(user: AuthUser) -> Self {
        let state = Self::default();
        state.set_user(Some(user));
        state
    }

    pub fn set_user(&self, user: Option<AuthUser>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuthProvider for AuthState {
    fn current_user(&self) -> Option<String> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|user| user.id.clone())
    }
}
