//! services/practice/src/app/session.rs
//!
//! Login state for the dashboard. The authenticated user is kept under the
//! `dental_user` key so a restart restores the session.

use dental_core::domain::{User, USER_KEY};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::MockDatabase;

pub struct LoginSession {
    db: Arc<MockDatabase>,
}

impl LoginSession {
    pub fn new(db: Arc<MockDatabase>) -> Self {
        Self { db }
    }

    /// Authenticates and persists the user. Returns `None` on bad credentials
    /// or when the user cannot be stored.
    pub async fn login(&self, email: &str, password: &str) -> Option<User> {
        let user = self.db.authenticate_user(email, password).await?;

        let stored = match serde_json::to_string(&user) {
            Ok(json) => self.db.store().set(USER_KEY, &json).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = stored {
            warn!("Failed to persist logged-in user: {}", e);
            return None;
        }

        info!(user_id = %user.id, role = ?user.role, "User logged in.");
        Some(user)
    }

    pub async fn logout(&self) {
        if let Err(e) = self.db.store().remove(USER_KEY).await {
            warn!("Failed to clear logged-in user: {}", e);
        }
    }

    /// The previously logged-in user, if any. A corrupt entry is removed.
    pub async fn restore(&self) -> Option<User> {
        let raw = match self.db.store().get(USER_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read logged-in user: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Failed to parse saved user: {}", e);
                self.logout().await;
                None
            }
        }
    }
}
