//! Secret lookup.

use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::ConfigError;

/// Source of named secrets such as API keys.
pub trait SecretStore: Send + Sync {
    /// Returns the value of the secret `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] if the secret does not exist.
    fn secret(&self, id: &str) -> Result<String, ConfigError>;
}

/// Reads secrets from a mounted secrets directory, then from the environment.
///
/// A secret `api_key_zirix` is read from `<dir>/api_key_zirix` if that file
/// exists, otherwise from the `API_KEY_ZIRIX` variable. Values are trimmed.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    dir: Option<PathBuf>,
}

impl EnvSecretStore {
    /// Creates a store reading files from `dir`, if given.
    #[must_use]
    pub const fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Creates a store for the directory named by `SECRETS_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("SECRETS_DIR").map(PathBuf::from))
    }

    fn from_file(&self, id: &str) -> Option<String> {
        let path = self.dir.as_ref()?.join(id);
        let value = fs::read_to_string(&path).ok()?;
        debug!(path = %path.display(), "read secret from file");
        non_empty(value)
    }
}

impl SecretStore for EnvSecretStore {
    fn secret(&self, id: &str) -> Result<String, ConfigError> {
        self.from_file(id)
            .or_else(|| std::env::var(id.to_uppercase()).ok().and_then(non_empty))
            .ok_or_else(|| ConfigError::MissingSecret(id.to_string()))
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_trimmed_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("api_key_zirix"), "  5f1d-guid\n").unwrap();

        let store = EnvSecretStore::new(Some(temp_dir.path().to_path_buf()));

        assert_eq!(store.secret("api_key_zirix").unwrap(), "5f1d-guid");
    }

    #[test]
    fn test_missing_secret() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("fleetload_blank_secret"), "\n").unwrap();
        let store = EnvSecretStore::new(Some(temp_dir.path().to_path_buf()));

        for id in ["fleetload_absent_secret", "fleetload_blank_secret"] {
            assert_eq!(
                store.secret(id).unwrap_err(),
                ConfigError::MissingSecret(id.to_string())
            );
        }
    }
}
