//! Local bearer credential storage.
//!
//! The token is an opaque string kept in `<data_dir>/credentials.json` under
//! the fixed key `auth_token`. A missing file or key means "not signed in".

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Key under which the token is stored.
pub const TOKEN_KEY: &str = "auth_token";

pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Login page used for every redirect.
pub const LOGIN_PATH: &str = "/auth/login";

/// Return destinations handed to the login flow.
pub const SEARCH_PAGE_PATH: &str = "/";
pub const COLLECTIONS_PATH: &str = "/collections";
pub const SAVED_SEARCHES_PATH: &str = "/saved-searches";
pub const SEARCH_HISTORY_PATH: &str = "/search-history";

/// Login location carrying `next` as the return destination.
pub fn login_redirect(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token. Unreadable or malformed files count as absent.
    pub fn token(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let map: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(&content)
        {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring malformed credentials file: {e}");
                return None;
            }
        };
        map.get(TOKEN_KEY)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating credentials directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&serde_json::json!({ TOKEN_KEY: token }))?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("restricting permissions on {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Remove the stored token; returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}
