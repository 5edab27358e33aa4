//! User directory with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base_dir>/users/
//! ├── usr-<uuid>.json
//! └── ...
//! ```

use crate::error::{Error, Result};
use crate::identity::types::{Role, UserRecord};
use crate::storage;
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

/// Lookup side of the identity store, as seen by the resolver
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    })
}

/// In-memory user store backed by JSON files
pub struct UserStore {
    users_dir: PathBuf,
    users: Arc<RwLock<Vec<UserRecord>>>,
}

impl UserStore {
    /// Open the store at `users_dir`, loading any existing users
    pub async fn new(users_dir: PathBuf) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&users_dir).await?;
        let users = storage::load_json_files::<UserRecord>(&users_dir);
        tracing::debug!(count = users.len(), "Loaded users");

        Ok(Self {
            users_dir,
            users: Arc::new(RwLock::new(users)),
        })
    }

    /// Register a user; email must be well-formed and not taken
    pub async fn add_user(&self, name: &str, email: &str, role: Role) -> Result<UserRecord> {
        let name = name.trim();
        let email = email.trim();

        let mut invalid = Vec::new();
        if name.is_empty() {
            invalid.push("name: must not be empty".to_string());
        }
        if !email_regex().is_match(email) {
            invalid.push("email: must be a valid address".to_string());
        }
        if !invalid.is_empty() {
            return Err(Error::Validation(invalid));
        }

        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(Error::Validation(vec![
                "email: already registered".to_string()
            ]));
        }

        let user = UserRecord {
            id: format!("usr-{}", uuid::Uuid::new_v4()),
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at: chrono::Utc::now(),
        };

        storage::write_json_file(&self.users_dir, &user.id, &user).await?;
        users.push(user.clone());

        tracing::info!(user_id = %user.id, role = %user.role, "User added");
        Ok(user)
    }

    /// List all users
    pub async fn list(&self) -> Vec<UserRecord> {
        self.users.read().await.clone()
    }
}

#[async_trait]
impl UserDirectory for UserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}
