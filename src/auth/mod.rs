//! User directory backed by a JSON file.
//!
//! Records carry a per-user salt and a hex-encoded SHA-256 of salt+password.
//! Plaintext passwords never touch the disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::common::AuthenticatedIdentity;
use crate::error::ChatError;

/// Default location of the user directory file.
pub const DEFAULT_USERS_FILE: &str = "users.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    user_name: String,
    displayed_name: String,
    salt: String,
    password_hash: String,
}

impl UserRecord {
    fn identity(&self) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            user_id: self.user_name.clone(),
            display_name: self.displayed_name.clone(),
        }
    }
}

pub struct UserDirectory {
    path: PathBuf,
}

impl UserDirectory {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn exists(&self, user_id: &str) -> bool {
        self.load()
            .iter()
            .any(|record| record.user_name == user_id)
    }

    /// Check a password against the stored hash. A missing user and a wrong
    /// password are indistinguishable to the caller.
    pub fn authenticate(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, ChatError> {
        let records = self.load();
        let record = records
            .iter()
            .find(|record| record.user_name == user_id)
            .ok_or(ChatError::InvalidCredentials)?;

        if hash_password(&record.salt, password) != record.password_hash {
            return Err(ChatError::InvalidCredentials);
        }
        Ok(record.identity())
    }

    pub fn register(
        &self,
        user_id: &str,
        display_name: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthenticatedIdentity, ChatError> {
        if password != confirm_password {
            return Err(ChatError::PasswordMismatch);
        }
        let mut records = self.load();
        if records.iter().any(|record| record.user_name == user_id) {
            return Err(ChatError::UserExists(user_id.to_string()));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let record = UserRecord {
            user_name: user_id.to_string(),
            displayed_name: display_name.to_string(),
            salt: salt.clone(),
            password_hash: hash_password(&salt, password),
        };
        let identity = record.identity();
        records.push(record);
        self.save(&records)?;
        Ok(identity)
    }

    fn load(&self) -> Vec<UserRecord> {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(records) => records,
                Err(err) => {
                    log::warn!("Failed to parse {}: {err}", self.path.display());
                    Vec::new()
                }
            },
            // Missing file just means nobody registered yet.
            Err(_) => Vec::new(),
        }
    }

    fn save(&self, records: &[UserRecord]) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(records).map_err(std::io::Error::from)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
