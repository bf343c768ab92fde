//! Credential verification used by the login route

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::{Choice, ConstantTimeEq};
use tokengate_auth::Role;

use crate::error::ApiError;

/// Verified account returned by a [`CredentialStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub subject: String,
    pub role: Role,
}

/// Source of truth for login credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the account when the credentials match, `None` otherwise
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Account>, ApiError>;
}

/// Account entry loaded from configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct StaticAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for StaticAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Fixed account list, typically from the config file
#[derive(Clone, Default)]
pub struct StaticCredentials {
    entries: Vec<AccountEntry>,
}

/// Account with its email and password reduced to fixed-length digests
#[derive(Clone)]
struct AccountEntry {
    email_digest: [u8; 32],
    password_digest: [u8; 32],
    account: Account,
}

impl StaticCredentials {
    pub fn new(accounts: Vec<StaticAccount>) -> Self {
        let entries = accounts
            .into_iter()
            .map(|a| AccountEntry {
                email_digest: email_digest(&a.email),
                password_digest: digest(a.password.as_bytes()),
                account: Account {
                    subject: a.email,
                    role: a.role,
                },
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("accounts", &self.entries.len())
            .finish()
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Account>, ApiError> {
        let email = email_digest(email);
        let password = digest(password.as_bytes());

        // Every entry is compared over equal-length digests, without early exit.
        let mut matched = None;
        for entry in &self.entries {
            let hit: Choice = entry.email_digest.as_slice().ct_eq(email.as_slice())
                & entry.password_digest.as_slice().ct_eq(password.as_slice());
            if bool::from(hit) && matched.is_none() {
                matched = Some(entry.account.clone());
            }
        }
        Ok(matched)
    }
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

fn email_digest(email: &str) -> [u8; 32] {
    digest(email.to_ascii_lowercase().as_bytes())
}
