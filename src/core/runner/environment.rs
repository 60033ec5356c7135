//! Values the tool reads from its process environment.
//!
//! These are handed to each child process explicitly; the runner's own
//! environment is left untouched.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

use crate::config::RunnerConfig;

pub const SECRET_KEY_VAR: &str = "SECRET_KEY";
pub const DB_NAME_VAR: &str = "SCANCODEIO_DB_NAME";
pub const DB_USER_VAR: &str = "SCANCODEIO_DB_USER";
pub const DB_PASSWORD_VAR: &str = "SCANCODEIO_DB_PASSWORD";

const SECRET_KEY_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEnvironment {
    pub secret_key: String,
    pub secret_key_generated: bool,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
}

impl RunEnvironment {
    pub fn from_config(config: &RunnerConfig) -> Self {
        let (secret_key, secret_key_generated) = match config
            .secret_key
            .as_deref()
            .filter(|key| !key.is_empty())
        {
            Some(key) => (key.to_string(), false),
            None => (generate_secret_key(), true),
        };

        Self {
            secret_key,
            secret_key_generated,
            db_name: config.database.name.clone(),
            db_user: config.database.user.clone(),
            db_password: config.database.password.clone(),
        }
    }

    /// Variable pairs to set on every tool invocation.
    pub fn vars(&self) -> Vec<(String, String)> {
        vec![
            (SECRET_KEY_VAR.to_string(), self.secret_key.clone()),
            (DB_NAME_VAR.to_string(), self.db_name.clone()),
            (DB_USER_VAR.to_string(), self.db_user.clone()),
            (DB_PASSWORD_VAR.to_string(), self.db_password.clone()),
        ]
    }
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_secret_key() -> String {
    let mut bytes = [0u8; SECRET_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
