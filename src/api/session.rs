//! Session persistence.
//!
//! Sessions are flat string maps under fixed keys, the same shape browser
//! local storage would hold. [`SessionStore`] is the seam the request client
//! uses, so tests can inject a [`MemorySessionStore`] and the CLI a
//! [`FileSessionStore`].

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use scopeguard::guard;
use thiserror::Error;

use crate::models::{LoginResponse, TokenPair, UserInfo};

/// Session persistence error types.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fixed keys a session is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
    UserId,
    UserEmail,
    UserRole,
    IsLoggedIn,
    IsAdmin,
}

impl SessionKey {
    pub const ALL: [SessionKey; 7] = [
        SessionKey::AccessToken,
        SessionKey::RefreshToken,
        SessionKey::UserId,
        SessionKey::UserEmail,
        SessionKey::UserRole,
        SessionKey::IsLoggedIn,
        SessionKey::IsAdmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::AccessToken => "accessToken",
            SessionKey::RefreshToken => "refreshToken",
            SessionKey::UserId => "userId",
            SessionKey::UserEmail => "userEmail",
            SessionKey::UserRole => "userRole",
            SessionKey::IsLoggedIn => "isLoggedIn",
            SessionKey::IsAdmin => "isAdmin",
        }
    }
}

/// Key/value store holding the client-side session.
///
/// Mutations never fail from the caller's point of view; implementations
/// backed by fallible storage log write errors and keep serving their
/// in-memory view.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Option<String>;
    fn set(&self, key: SessionKey, value: &str);
    fn remove(&self, key: SessionKey);
    /// Drop every session key.
    fn clear(&self);

    fn access_token(&self) -> Option<String> {
        self.get(SessionKey::AccessToken).filter(|t| !t.is_empty())
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(SessionKey::RefreshToken).filter(|t| !t.is_empty())
    }

    /// Replace both tokens.
    fn store_tokens(&self, tokens: &TokenPair) {
        self.set(SessionKey::AccessToken, &tokens.access_token);
        self.set(SessionKey::RefreshToken, &tokens.refresh_token);
    }

    /// Persist a fresh login: tokens plus user identity.
    fn store_login(&self, login: &LoginResponse) {
        self.store_tokens(&login.tokens);
        self.set(SessionKey::UserId, &login.user.id);
        self.set(SessionKey::UserEmail, &login.user.email);
        self.set(SessionKey::UserRole, &login.user.role);
        self.set(SessionKey::IsLoggedIn, "true");
        self.set(
            SessionKey::IsAdmin,
            if login.user.is_admin() { "true" } else { "false" },
        );
    }

    fn is_logged_in(&self) -> bool {
        self.get(SessionKey::IsLoggedIn).as_deref() == Some("true") && self.access_token().is_some()
    }

    /// Identity of the stored user, if a full one is present.
    fn identity(&self) -> Option<UserInfo> {
        Some(UserInfo {
            id: self.get(SessionKey::UserId)?,
            email: self.get(SessionKey::UserEmail)?,
            role: self.get(SessionKey::UserRole).unwrap_or_default(),
        })
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Session store kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a token pair.
    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        let store = Self::new();
        store.set(SessionKey::AccessToken, access_token);
        store.set(SessionKey::RefreshToken, refresh_token);
        store.set(SessionKey::IsLoggedIn, "true");
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        lock(&self.values).get(key.as_str()).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) {
        lock(&self.values).insert(key.as_str().to_string(), value.to_string());
    }

    fn remove(&self, key: SessionKey) {
        lock(&self.values).remove(key.as_str());
    }

    fn clear(&self) {
        lock(&self.values).clear();
    }
}

/// Session store persisted as a JSON object on disk.
///
/// Every mutation rewrites the file atomically (temp file + rename).
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let values = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) {
        if let Err(e) = write_atomically(&self.path, values) {
            tracing::error!("Failed to persist session to {}: {}", self.path.display(), e);
        }
    }
}

fn write_atomically(path: &Path, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    let cleanup = guard(tmp_path.clone(), |p| {
        let _ = std::fs::remove_file(p);
    });
    {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut writer = BufWriter::new(&file);
        serde_json::to_writer_pretty(&mut writer, values)?;
        writer.flush()?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    scopeguard::ScopeGuard::into_inner(cleanup);
    Ok(())
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        lock(&self.values).get(key.as_str()).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) {
        let mut values = lock(&self.values);
        values.insert(key.as_str().to_string(), value.to_string());
        self.persist(&values);
    }

    fn remove(&self, key: SessionKey) {
        let mut values = lock(&self.values);
        if values.remove(key.as_str()).is_some() {
            self.persist(&values);
        }
    }

    fn clear(&self) {
        let mut values = lock(&self.values);
        for key in SessionKey::ALL {
            values.remove(key.as_str());
        }
        self.persist(&values);
    }
}
