//! Session store: at most one signed-in user, mirrored to a JSON file.
//!
//! The in-memory profile is authoritative for the lifetime of the process;
//! the file only exists so a restart picks the session up again.
//!
//! # Authentication
//!
//! There is no credential exchange. In [`AuthMode::Demo`] `login` and
//! `register` never check credentials against anything and fabricate a
//! profile from what the user typed. [`AuthMode::Disabled`] refuses both,
//! for deployments that must not pretend to authenticate. A real
//! credential-issuing exchange would plug in here and hand its token to
//! [`SessionStore::attach_token`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::types::SessionUser;
use crate::{NutriscopeError, Result};

/// Avatar given to fabricated demo profiles.
pub const DEMO_AVATAR_URL: &str = "https://randomuser.me/api/portraits/lego/1.jpg";

/// How `login`/`register` behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Always succeed and fabricate a profile.
    #[default]
    Demo,
    /// Refuse with [`NutriscopeError::AuthUnavailable`].
    Disabled,
}

/// Shared handle to the session. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    user: Arc<RwLock<Option<SessionUser>>>,
    path: Option<PathBuf>,
    mode: AuthMode,
}

impl SessionStore {
    /// Open the store backed by `path`, restoring a persisted profile.
    ///
    /// A missing file means signed out; a corrupt one is logged and ignored.
    pub fn open(path: impl Into<PathBuf>, mode: AuthMode) -> Self {
        let path = path.into();
        let user = load_persisted(&path);
        if let Some(ref u) = user {
            debug!(user = %u.id, path = %path.display(), "restored session");
        }
        Self {
            user: Arc::new(RwLock::new(user)),
            path: Some(path),
            mode,
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(mode: AuthMode) -> Self {
        Self {
            user: Arc::new(RwLock::new(None)),
            path: None,
            mode,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Bearer token of the signed-in user, if any.
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().and_then(|u| u.token.clone())
    }

    /// Sign in. In demo mode the password is ignored and any email is accepted.
    pub fn login(&self, email: &str, _password: &str) -> Result<SessionUser> {
        self.require_demo()?;
        let email = require_email(email)?;
        let name = email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .unwrap_or("Demo User")
            .to_string();
        self.establish(demo_profile(name, email))
    }

    /// Create an account. In demo mode this is equivalent to signing in.
    pub fn register(&self, name: &str, email: &str, _password: &str) -> Result<SessionUser> {
        self.require_demo()?;
        let email = require_email(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(NutriscopeError::Validation("Please enter your name".to_string()));
        }
        self.establish(demo_profile(name.to_string(), email))
    }

    /// Attach a bearer token to the signed-in user and persist it.
    pub fn attach_token(&self, token: impl Into<String>) -> Result<()> {
        let updated = {
            let mut guard = self.write();
            let user = guard.as_mut().ok_or_else(|| {
                NutriscopeError::SessionStore("no signed-in user to attach a token to".into())
            })?;
            user.token = Some(token.into());
            user.clone()
        };
        self.persist(&updated)
    }

    /// Sign out: clear memory first, then the persisted file.
    ///
    /// Memory is cleared even when removing the file fails.
    pub fn logout(&self) -> Result<()> {
        let previous = self.write().take();
        if let Some(user) = previous {
            info!(user = %user.id, "signed out");
        }
        let Some(path) = &self.path else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NutriscopeError::SessionStore(format!(
                "failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    fn require_demo(&self) -> Result<()> {
        match self.mode {
            AuthMode::Demo => Ok(()),
            AuthMode::Disabled => Err(NutriscopeError::AuthUnavailable),
        }
    }

    fn establish(&self, user: SessionUser) -> Result<SessionUser> {
        self.persist(&user)?;
        *self.write() = Some(user.clone());
        info!(user = %user.id, email = %user.email, "signed in (demo mode)");
        Ok(user)
    }

    /// Atomic write via tmp + rename, owner-only permissions on unix.
    fn persist(&self, user: &SessionUser) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NutriscopeError::SessionStore(format!("mkdir {}: {e}", parent.display()))
            })?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(user)?;
        std::fs::write(&tmp_path, json).map_err(|e| {
            NutriscopeError::SessionStore(format!("write {}: {e}", tmp_path.display()))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600)).map_err(
                |e| NutriscopeError::SessionStore(format!("chmod {}: {e}", tmp_path.display())),
            )?;
        }

        std::fs::rename(&tmp_path, path).map_err(|e| {
            NutriscopeError::SessionStore(format!(
                "rename {} → {}: {e}",
                tmp_path.display(),
                path.display()
            ))
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<SessionUser>> {
        self.user.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<SessionUser>> {
        self.user.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn require_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(NutriscopeError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(email.to_string())
}

fn demo_profile(name: String, email: String) -> SessionUser {
    SessionUser {
        id: "1".to_string(),
        name,
        email,
        avatar_url: Some(DEMO_AVATAR_URL.to_string()),
        token: None,
    }
}

fn load_persisted(path: &Path) -> Option<SessionUser> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read session file");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt session file");
            None
        }
    }
}
