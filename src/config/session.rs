//! Persisted sign-in state
//!
//! `session.json` in the data directory holds the access token issued at
//! login. The dashboard only reads it; `--login` and the login view write it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Whatever else the login flow stored (refresh token, user info)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    pub fn path() -> Result<PathBuf> {
        Ok(super::app_dir(dirs::data_dir(), "data")?.join("session.json"))
    }

    /// Missing or malformed files read as "signed out"
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Ignoring malformed session file: {}", e);
                Self::default()
            }
        }
    }

    /// The bearer token, if one is present and non-blank
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write session to {}", path.display()))?;
        Ok(())
    }

    /// Store `token` at `path`, keeping any other fields already there
    pub fn store_token(path: &Path, token: &str) -> Result<Self> {
        let mut session = Self::load_from(path);
        session.access_token = Some(token.trim().to_string());
        session.save_to(path)?;
        tracing::info!("Session saved to {}", path.display());
        Ok(session)
    }

    /// Remove the session file at `path`
    pub fn clear(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session"),
        }
    }
}
