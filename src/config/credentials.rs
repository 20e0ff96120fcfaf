//! OKX API credentials
//!
//! Loaded from the environment. All four values are required for signed
//! requests; they are wrapped in `SecretString` so they never show up in
//! `Debug` output or logs, and there is no `Serialize` impl.

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};

/// Environment variable names
pub mod env_vars {
    pub const API_KEY: &str = "OKX_API_KEY";
    pub const SECRET_KEY: &str = "OKX_SECRET_KEY";
    pub const PASSPHRASE: &str = "OKX_API_PASSPHRASE";
    pub const PROJECT_ID: &str = "OKX_PROJECT_ID";
}

/// The four values required by the OKX signing scheme
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    api_key: SecretString,
    secret_key: SecretString,
    passphrase: SecretString,
    project_id: String,
}

impl ApiCredentials {
    /// Build credentials, rejecting absent or blank values
    ///
    /// # Errors
    /// `MissingCredentials` naming every blank field.
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();
        let passphrase = passphrase.into();
        let project_id = project_id.into();

        let missing: Vec<&str> = [
            (env_vars::API_KEY, &api_key),
            (env_vars::SECRET_KEY, &secret_key),
            (env_vars::PASSPHRASE, &passphrase),
            (env_vars::PROJECT_ID, &project_id),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(Error::MissingCredentials(missing.join(", ")));
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            secret_key: SecretString::from(secret_key),
            passphrase: SecretString::from(passphrase),
            project_id,
        })
    }

    /// Load from `OKX_API_KEY`, `OKX_SECRET_KEY`, `OKX_API_PASSPHRASE` and
    /// `OKX_PROJECT_ID`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            lookup(env_vars::API_KEY).unwrap_or_default(),
            lookup(env_vars::SECRET_KEY).unwrap_or_default(),
            lookup(env_vars::PASSPHRASE).unwrap_or_default(),
            lookup(env_vars::PROJECT_ID).unwrap_or_default(),
        )
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    pub(crate) fn passphrase(&self) -> &str {
        self.passphrase.expose_secret()
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}
