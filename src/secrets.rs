//! Lookup of the storage account key

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

const ENV_PREFIX: &str = "PROJECT_MOVIES_SECRET";

/// Storage account key. Its value never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn new(value: impl Into<String>) -> Self {
        AccountKey(value.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccountKey(***)")
    }
}

/// Name of a secret: a scope plus a key within it
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub scope: String,
    pub key: String,
}

pub trait SecretStore {
    fn get(&self, scope: &str, key: &str) -> Result<AccountKey, anyhow::Error>;
}

/// Reads `PROJECT_MOVIES_SECRET_<SCOPE>_<KEY>` from the environment
#[derive(Debug, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn variable_name(scope: &str, key: &str) -> String {
        let normalize = |s: &str| {
            s.chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
                .collect::<String>()
        };
        format!("{ENV_PREFIX}_{}_{}", normalize(scope), normalize(key))
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, scope: &str, key: &str) -> Result<AccountKey, anyhow::Error> {
        let name = Self::variable_name(scope, key);
        std::env::var(&name)
            .map(AccountKey)
            .map_err(|e| anyhow::anyhow!("Secret '{key}' in scope '{scope}' is unavailable ({name}): {e}"))
    }
}

/// In-memory store keyed by `(scope, key)`
#[derive(Debug, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<(String, String), AccountKey>,
}

impl StaticSecretStore {
    pub fn with(mut self, scope: &str, key: &str, value: &str) -> Self {
        self.secrets
            .insert((scope.to_string(), key.to_string()), AccountKey::new(value));
        self
    }
}

impl SecretStore for StaticSecretStore {
    fn get(&self, scope: &str, key: &str) -> Result<AccountKey, anyhow::Error> {
        self.secrets
            .get(&(scope.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Secret '{key}' in scope '{scope}' does not exist"))
    }
}
