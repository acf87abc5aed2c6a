//! Profile Store
//!
//! Persists the login token, the profile of the signed-in user, and the
//! just-logged-in marker the welcome banner consumes. Backed by a small
//! JSON file under the user's data directory; reads go to disk on each
//! access so an external login flow and a running surface see the same
//! state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when accessing the profile store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or write the store file
    #[error("Failed to access profile store at {path}: {source}")]
    Io {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// The store file holds invalid JSON
    #[error("Failed to parse profile store: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Profile of the signed-in user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display username
    pub username: String,
}

/// On-disk store shape; every field optional
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoreData {
    /// Bearer token for authenticated requests
    token: Option<String>,
    /// Signed-in user profile
    user: Option<Profile>,
    /// Welcome banner marker, "true" right after a login
    just_logged_in: Option<String>,
}

/// File-backed profile store
#[derive(Clone, Debug)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store at an explicit path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default path, `$XDG_DATA_HOME/reminder/profile.json`
    pub fn default_store() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join("reminder").join("profile.json")))
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored login token, if any
    ///
    /// A missing store file means no one is logged in, not an error.
    pub fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.token)
    }

    /// Stored user profile, if any
    pub fn profile(&self) -> Result<Option<Profile>, StoreError> {
        Ok(self.read()?.user)
    }

    /// Whether the just-logged-in marker is set
    pub fn just_logged_in(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.just_logged_in.as_deref() == Some("true"))
    }

    /// Clear the just-logged-in marker
    ///
    /// The welcome banner is shown once per login; the first surface to
    /// display it clears the marker.
    pub fn clear_just_logged_in(&self) -> Result<(), StoreError> {
        let mut data = self.read()?;
        if data.just_logged_in.is_none() {
            return Ok(());
        }
        data.just_logged_in = None;
        self.write(&data)
    }

    /// Record a login: token, profile, and the banner marker together
    pub fn record_login(&self, token: &str, profile: Profile) -> Result<(), StoreError> {
        let mut data = self.read()?;
        data.token = Some(token.to_string());
        data.user = Some(profile);
        data.just_logged_in = Some("true".to_string());
        self.write(&data)
    }

    /// Forget the stored token and profile
    pub fn clear(&self) -> Result<(), StoreError> {
        self.write(&StoreData::default())
    }

    fn read(&self) -> Result<StoreData, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreData::default()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, data: &StoreData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, contents).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_store(dir: &tempfile::TempDir) -> ProfileStore {
        ProfileStore::new(dir.path().join("profile.json"))
    }

    #[test]
    fn test_missing_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.profile().unwrap(), None);
        assert!(!store.just_logged_in().unwrap());
    }

    #[test]
    fn test_record_login_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        store
            .record_login(
                "tok-123",
                Profile {
                    username: "ada".to_string(),
                },
            )
            .unwrap();

        assert_eq!(store.token().unwrap().as_deref(), Some("tok-123"));
        assert_eq!(store.profile().unwrap().unwrap().username, "ada");
        assert!(store.just_logged_in().unwrap());
    }

    #[test]
    fn test_clear_marker_keeps_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        store
            .record_login(
                "tok-123",
                Profile {
                    username: "ada".to_string(),
                },
            )
            .unwrap();

        store.clear_just_logged_in().unwrap();
        assert!(!store.just_logged_in().unwrap());
        assert_eq!(store.token().unwrap().as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_marker_only_true_string_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        std::fs::write(
            store.path(),
            r#"{"token":"t","just_logged_in":"false"}"#,
        )
        .unwrap();

        assert!(!store.just_logged_in().unwrap());
    }

    #[test]
    fn test_clear_forgets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        store
            .record_login(
                "tok",
                Profile {
                    username: "ada".to_string(),
                },
            )
            .unwrap();

        store.clear().unwrap();
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.profile().unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.token(), Err(StoreError::Parse(_))));
    }
}
