//! Client-local storage.
//!
//! Holds what must survive between runs: the session token with its
//! issuance time, and the last calendar view the user picked. Everything is
//! stored under fixed keys in one small TOML file.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalAppError, CalAppResult};
use crate::view::CalendarView;

/// An opaque session token and the moment it was issued.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub issued_at: DateTime<Utc>,
}

impl Token {
    /// A token issued now.
    pub fn issued_now(value: impl Into<String>) -> Self {
        Token {
            value: value.into(),
            issued_at: Utc::now(),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// On-disk layout. Field names are the well-known storage keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StorageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(rename = "token-init-date", skip_serializing_if = "Option::is_none")]
    token_init_date: Option<DateTime<Utc>>,
    #[serde(rename = "lastView", skip_serializing_if = "Option::is_none")]
    last_view: Option<CalendarView>,
}

impl StorageData {
    fn token(&self) -> Option<Token> {
        let value = self.token.clone().filter(|t| !t.is_empty())?;
        Some(Token {
            value,
            issued_at: self.token_init_date.unwrap_or(DateTime::UNIX_EPOCH),
        })
    }
}

/// Key-value storage that persists for the lifetime of a session.
pub trait ClientStorage: Send + Sync {
    fn token(&self) -> CalAppResult<Option<Token>>;
    fn set_token(&self, token: &Token) -> CalAppResult<()>;
    fn last_view(&self) -> CalAppResult<Option<CalendarView>>;
    fn set_last_view(&self, view: CalendarView) -> CalAppResult<()>;
    /// Remove every key in one step.
    fn clear(&self) -> CalAppResult<()>;
}

/// Storage backed by a TOML file.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CalAppResult<StorageData> {
        if !self.path.exists() {
            return Ok(StorageData::default());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            CalAppError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        Ok(toml::from_str(&contents)?)
    }

    /// Write through a temp file and rename, so readers never see a torn file.
    fn save(&self, data: &StorageData) -> CalAppResult<()> {
        let contents = toml::to_string_pretty(data)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = self.path.with_extension("toml.tmp");
        let mut file = create_private(&temp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut StorageData)) -> CalAppResult<()> {
        let mut data = self.load()?;
        f(&mut data);
        self.save(&data)
    }
}

/// Create `path` fresh, owner-only (0600) on unix from the first byte, since
/// it holds a session token. A leftover file from an interrupted save is
/// replaced.
fn create_private(path: &Path) -> CalAppResult<File> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(options.open(path)?)
}

impl ClientStorage for FileStorage {
    fn token(&self) -> CalAppResult<Option<Token>> {
        Ok(self.load()?.token())
    }

    fn set_token(&self, token: &Token) -> CalAppResult<()> {
        self.update(|data| {
            data.token = Some(token.value.clone());
            data.token_init_date = Some(token.issued_at);
        })
    }

    fn last_view(&self) -> CalAppResult<Option<CalendarView>> {
        Ok(self.load()?.last_view)
    }

    fn set_last_view(&self, view: CalendarView) -> CalAppResult<()> {
        self.update(|data| data.last_view = Some(view))
    }

    fn clear(&self) -> CalAppResult<()> {
        self.save(&StorageData::default())
    }
}

/// In-process storage, for tests and embedding.
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<StorageData>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        let storage = Self::default();
        if let Ok(mut data) = storage.data.lock() {
            data.token = Some(token.value);
            data.token_init_date = Some(token.issued_at);
        }
        storage
    }

    fn with_data<R>(&self, f: impl FnOnce(&mut StorageData) -> R) -> CalAppResult<R> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| CalAppError::Storage("storage lock poisoned".into()))?;
        Ok(f(&mut data))
    }
}

impl ClientStorage for MemoryStorage {
    fn token(&self) -> CalAppResult<Option<Token>> {
        self.with_data(|data| data.token())
    }

    fn set_token(&self, token: &Token) -> CalAppResult<()> {
        self.with_data(|data| {
            data.token = Some(token.value.clone());
            data.token_init_date = Some(token.issued_at);
        })
    }

    fn last_view(&self) -> CalAppResult<Option<CalendarView>> {
        self.with_data(|data| data.last_view)
    }

    fn set_last_view(&self, view: CalendarView) -> CalAppResult<()> {
        self.with_data(|data| data.last_view = Some(view))
    }

    fn clear(&self) -> CalAppResult<()> {
        self.with_data(|data| *data = StorageData::default())
    }
}
