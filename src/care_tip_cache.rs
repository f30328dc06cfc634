//! Deferred care-tip results, keyed by dialogue session and request.
//!
//! The producer writes one `ComposedResponse` per key from a worker thread;
//! the hosting layer polls for it later from a different request. A missing
//! entry means "not ready"; a stored response with `success = false` is a
//! finished failure and is returned like any other.
//!
//! Two backends:
//! - `InMemoryCareTipCache` for a single process
//! - `FileCareTipCache`, one `{session}-{request}.json` per entry, written
//!   through a temp file and rename so readers never see a partial record

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ComposedResponse;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache key component: '{0}'")]
    InvalidKey(String),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// Keys
// ═══════════════════════════════════════════════════════════

static KEY_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").unwrap());

fn validate_component(raw: &str) -> Result<String, CacheError> {
    let trimmed = raw.trim();
    if KEY_COMPONENT.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(CacheError::InvalidKey(raw.to_string()))
    }
}

/// Dialogue session identifier, restricted to filename-safe characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: &str) -> Result<Self, CacheError> {
        validate_component(raw).map(Self)
    }

    /// Last segment of a session resource path such as
    /// `projects/p/agent/sessions/abc123`.
    pub fn from_session_path(path: &str) -> Result<Self, CacheError> {
        let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
        Self::new(last)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// (session, request) pair identifying one deferred result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CareTipKey {
    session: SessionId,
    request_id: String,
}

impl CareTipKey {
    pub fn new(session: SessionId, request_id: &str) -> Result<Self, CacheError> {
        Ok(Self {
            session,
            request_id: validate_component(request_id)?,
        })
    }

    /// Key with a fresh random request id.
    pub fn with_new_request(session: SessionId) -> Self {
        Self {
            session,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.session, self.request_id)
    }
}

impl std::fmt::Display for CareTipKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.session, self.request_id)
    }
}

// ═══════════════════════════════════════════════════════════
// CareTipCache
// ═══════════════════════════════════════════════════════════

/// Keyed store for composed responses. Last writer wins.
pub trait CareTipCache: Send + Sync {
    fn put(&self, key: &CareTipKey, response: &ComposedResponse) -> Result<(), CacheError>;

    fn get(&self, key: &CareTipKey) -> Result<Option<ComposedResponse>, CacheError>;

    fn contains(&self, key: &CareTipKey) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }
}

#[derive(Default)]
pub struct InMemoryCareTipCache {
    entries: RwLock<HashMap<CareTipKey, ComposedResponse>>,
}

impl InMemoryCareTipCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CareTipCache for InMemoryCareTipCache {
    fn put(&self, key: &CareTipKey, response: &ComposedResponse) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        entries.insert(key.clone(), response.clone());
        Ok(())
    }

    fn get(&self, key: &CareTipKey) -> Result<Option<ComposedResponse>, CacheError> {
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }
}

pub struct FileCareTipCache {
    dir: PathBuf,
}

impl FileCareTipCache {
    /// Open (creating if needed) a cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CareTipKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl CareTipCache for FileCareTipCache {
    fn put(&self, key: &CareTipKey, response: &ComposedResponse) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec_pretty(response)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        tracing::debug!(key = %key, "Stored care tip");
        Ok(())
    }

    fn get(&self, key: &CareTipKey) -> Result<Option<ComposedResponse>, CacheError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
