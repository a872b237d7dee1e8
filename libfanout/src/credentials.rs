//! Per-platform credential storage
//!
//! Credentials are an opaque key-value bag per platform, persisted as a flat
//! TOML blob the way the host CMS kept them in a single option row. Unknown
//! keys are stripped against a per-platform allow-list before persistence;
//! the dispatch path only ever reads.
//!
//! The store is injected behind the [`CredentialStore`] trait so the
//! coordinator, the OAuth exchange, and the settings surface share one seam.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::types::Platform;

/// Secret fields for one platform. Values are opaque strings.
pub type CredentialBag = BTreeMap<String, String>;

/// Fields recognized for each platform. Anything else is dropped on write.
pub fn allowed_fields(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Facebook => &["api_key", "page_id"],
        Platform::Twitter => &["api_key", "api_secret", "bearer_token"],
        Platform::Linkedin => &[
            "client_id",
            "client_secret",
            "access_token",
            "access_token_expires",
            "member_urn",
        ],
        Platform::Instagram => &["api_key"],
    }
}

/// Drop any field not on the platform's allow-list.
pub fn strip_unknown_fields(platform: Platform, fields: CredentialBag) -> CredentialBag {
    let allowed = allowed_fields(platform);
    fields
        .into_iter()
        .filter(|(key, _)| allowed.contains(&key.as_str()))
        .collect()
}

/// True when the bag holds no usable secret at all.
pub fn is_empty_bag(bag: &CredentialBag) -> bool {
    bag.values().all(|value| value.trim().is_empty())
}

/// Storage seam for per-platform credentials plus a small global key space
/// used by the LinkedIn OAuth machinery (issued nonce).
pub trait CredentialStore: Send + Sync {
    /// Read the credential bag for a platform. Missing platform yields an
    /// empty bag, not an error.
    fn get(&self, platform: Platform) -> Result<CredentialBag, StoreError>;

    /// Replace the platform's bag. Unknown fields are stripped; the stored
    /// bag is returned.
    fn set(&self, platform: Platform, fields: CredentialBag) -> Result<CredentialBag, StoreError>;

    fn get_global(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a global key; `None` removes it.
    fn set_global(&self, key: &str, value: Option<String>) -> Result<(), StoreError>;

    /// Overlay `updates` onto the stored bag and persist the result.
    fn merge(
        &self,
        platform: Platform,
        updates: CredentialBag,
    ) -> Result<CredentialBag, StoreError> {
        let mut bag = self.get(platform)?;
        bag.extend(updates);
        self.set(platform, bag)
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    platforms: BTreeMap<String, CredentialBag>,
    #[serde(default)]
    globals: BTreeMap<String, String>,
}

/// TOML-file-backed credential store.
///
/// The file is the operator's to manage; it is created on first write with
/// owner-only permissions.
pub struct FileCredentialStore {
    path: PathBuf,
    state: Mutex<StoreFile>,
}

impl std::fmt::Debug for FileCredentialStore {
    // Secrets stay out of Debug output
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FileCredentialStore {
    /// Open a store at `path`, loading existing contents if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            StoreFile::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(state)?;
        std::fs::write(&self.path, serialized)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, platform: Platform) -> Result<CredentialBag, StoreError> {
        let state = self.state.lock().expect("credential store lock poisoned");
        Ok(state
            .platforms
            .get(platform.as_str())
            .cloned()
            .unwrap_or_default())
    }

    fn set(&self, platform: Platform, fields: CredentialBag) -> Result<CredentialBag, StoreError> {
        let stored = strip_unknown_fields(platform, fields);
        let mut state = self.state.lock().expect("credential store lock poisoned");
        state
            .platforms
            .insert(platform.as_str().to_string(), stored.clone());
        self.persist(&state)?;
        Ok(stored)
    }

    fn get_global(&self, key: &str) -> Result<Option<String>, StoreError> {
        let state = self.state.lock().expect("credential store lock poisoned");
        Ok(state.globals.get(key).cloned())
    }

    fn set_global(&self, key: &str, value: Option<String>) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("credential store lock poisoned");
        match value {
            Some(value) => {
                state.globals.insert(key.to_string(), value);
            }
            None => {
                state.globals.remove(key);
            }
        }
        self.persist(&state)
    }
}

/// In-memory store for tests and the one-shot CLI.
#[derive(Default)]
pub struct MemoryCredentialStore {
    state: Mutex<StoreFile>,
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore").finish_non_exhaustive()
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor seeding one platform's bag.
    pub fn with_platform(platform: Platform, fields: CredentialBag) -> Self {
        let store = Self::new();
        store
            .set(platform, fields)
            .expect("memory store never fails");
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, platform: Platform) -> Result<CredentialBag, StoreError> {
        let state = self.state.lock().expect("credential store lock poisoned");
        Ok(state
            .platforms
            .get(platform.as_str())
            .cloned()
            .unwrap_or_default())
    }

    fn set(&self, platform: Platform, fields: CredentialBag) -> Result<CredentialBag, StoreError> {
        let stored = strip_unknown_fields(platform, fields);
        let mut state = self.state.lock().expect("credential store lock poisoned");
        state
            .platforms
            .insert(platform.as_str().to_string(), stored.clone());
        Ok(stored)
    }

    fn get_global(&self, key: &str) -> Result<Option<String>, StoreError> {
        let state = self.state.lock().expect("credential store lock poisoned");
        Ok(state.globals.get(key).cloned())
    }

    fn set_global(&self, key: &str, value: Option<String>) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("credential store lock poisoned");
        match value {
            Some(value) => {
                state.globals.insert(key.to_string(), value);
            }
            None => {
                state.globals.remove(key);
            }
        }
        Ok(())
    }
}

/// Build a bag from field/value pairs. Test and CLI convenience.
pub fn bag(fields: &[(&str, &str)]) -> CredentialBag {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
