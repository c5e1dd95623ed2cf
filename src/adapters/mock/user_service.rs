use crate::adapters::error::CollaboratorError;
use crate::domain::{AuthToken, Permissions, UserId};
use crate::ports::user_service::{Result, User, UserService as UserServiceTrait};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock implementation of UserService
///
/// Supports stateful testing by mapping auth tokens to users.
/// Unknown tokens are rejected with `CollaboratorError::InvalidToken`.
pub struct UserService {
    users: Mutex<HashMap<AuthToken, User>>,
}

impl UserService {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Register a token for testing purposes
    pub fn add_user(&self, token: AuthToken, user_id: UserId, permissions: Permissions) {
        self.users.lock().unwrap().insert(
            token,
            User {
                id: user_id,
                permissions,
            },
        );
    }
}

impl Default for UserService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserServiceTrait for UserService {
    /// Look up the user registered for the token
    async fn verify_token(&self, token: &AuthToken) -> Result<User> {
        self.users
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| CollaboratorError::InvalidToken.into())
    }
}
