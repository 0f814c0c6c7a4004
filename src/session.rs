//! Signed-in user context.
//!
//! A [`Session`] is created once at start-up, rehydrated from its
//! [`SessionStore`] once, handed to whatever needs the credential, and torn
//! down by [`Session::logout`].

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::api::AuthApi;
use crate::error::{ApiError, SessionError};
use crate::models::{AuthResponse, UserProfile};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct StoredSession {
    token: String,
    user: UserProfile,
}

/// JSON file holding the token between runs
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                warn!("Discarding unreadable session file {}: {}", self.path.display(), e);
                self.clear().await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, stored: &StoredSession) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(stored)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    store: SessionStore,
    current: Option<StoredSession>,
    rehydrated: bool,
}

impl Session {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            current: None,
            rehydrated: false,
        }
    }

    /// Loads the persisted credential. Only the first call reads the store.
    pub async fn rehydrate(&mut self) -> Result<(), SessionError> {
        if self.rehydrated {
            return Ok(());
        }
        self.rehydrated = true;
        self.current = self.store.load().await?;
        if let Some(stored) = &self.current {
            debug!("Rehydrated session for {}", stored.user.email);
        }
        Ok(())
    }

    pub async fn sign_in(&mut self, auth: AuthResponse) -> Result<(), SessionError> {
        let stored = StoredSession {
            token: auth.token,
            user: auth.user,
        };
        self.store.save(&stored).await?;
        info!("Signed in as {}", stored.user.name);
        self.current = Some(stored);
        self.rehydrated = true;
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(stored) = self.current.take() {
            info!("Signed out {}", stored.user.email);
        }
        self.store.clear().await
    }

    /// Confirms a rehydrated token is still accepted; a rejected one signs
    /// the session out. Transport failures leave the session alone.
    pub async fn verify(&mut self, auth: &dyn AuthApi) -> Result<bool, SessionError> {
        if self.current.is_none() {
            return Ok(false);
        }
        match auth.me().await {
            Ok(user) => {
                if let Some(stored) = self.current.as_mut() {
                    if stored.user != user {
                        stored.user = user;
                        self.store.save(stored).await?;
                    }
                }
                Ok(true)
            }
            Err(ApiError::Unauthorized(detail)) => {
                warn!("Stored session rejected: {}", detail);
                self.logout().await?;
                Ok(false)
            }
            Err(e) => {
                warn!("Could not verify session: {}", e);
                Ok(true)
            }
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}
