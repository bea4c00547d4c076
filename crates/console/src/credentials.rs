//! Credential persistence across restarts.
//!
//! Exactly one opaque credential is stored per console, replaced wholesale on
//! every write. Backends:
//! - [`MemoryCredentialStore`]: tests and headless runs without a data dir.
//! - [`FileCredentialStore`]: native, a single file with 0600 permissions.
//! - [`LocalStorageCredentialStore`]: browser `localStorage["token"]`.

use std::sync::Mutex;

use anyhow::Result;

use omnicorp_auth::Credential;

/// Storage backend for the persisted credential.
///
/// Failures are reported, never swallowed here; the session layer decides to
/// log them and carry on.
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when nothing (or nothing usable) is stored.
    fn load(&self) -> Result<Option<Credential>>;

    fn save(&self, credential: &Credential) -> Result<()>;

    /// Succeeds when nothing was stored.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Credential>>> {
        self.slot
            .lock()
            .map_err(|_| anyhow::anyhow!("credential slot poisoned"))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        *self.lock()? = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileCredentialStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};

    use omnicorp_auth::Credential;

    use super::CredentialStore;

    /// Plain-text token file, written through a temporary sibling and renamed
    /// into place.
    #[derive(Debug, Clone)]
    pub struct FileCredentialStore {
        path: PathBuf,
    }

    impl FileCredentialStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl CredentialStore for FileCredentialStore {
        fn load(&self) -> Result<Option<Credential>> {
            let raw = match fs::read_to_string(&self.path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => {
                    return Err(e).with_context(|| format!("reading {}", self.path.display()));
                }
            };

            match Credential::new(raw) {
                Ok(credential) => Ok(Some(credential)),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unusable stored credential");
                    Ok(None)
                }
            }
        }

        fn save(&self, credential: &Credential) -> Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }

            let tmp = self.path.with_extension("tmp");
            fs::write(&tmp, credential.as_str())
                .with_context(|| format!("writing {}", tmp.display()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))
                    .with_context(|| format!("restricting {}", tmp.display()))?;
            }

            fs::rename(&tmp, &self.path)
                .with_context(|| format!("replacing {}", self.path.display()))?;
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageCredentialStore;

#[cfg(target_arch = "wasm32")]
mod local_storage {
    use anyhow::{anyhow, Result};

    use omnicorp_auth::Credential;

    use super::CredentialStore;

    /// Key under which the browser build keeps the token.
    pub const STORAGE_KEY: &str = "token";

    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStorageCredentialStore;

    fn storage() -> Result<web_sys::Storage> {
        web_sys::window()
            .ok_or_else(|| anyhow!("no window"))?
            .local_storage()
            .map_err(|e| anyhow!("localStorage unavailable: {e:?}"))?
            .ok_or_else(|| anyhow!("localStorage disabled"))
    }

    impl CredentialStore for LocalStorageCredentialStore {
        fn load(&self) -> Result<Option<Credential>> {
            let raw = storage()?
                .get_item(STORAGE_KEY)
                .map_err(|e| anyhow!("reading {STORAGE_KEY}: {e:?}"))?;
            Ok(raw.and_then(|raw| Credential::new(raw).ok()))
        }

        fn save(&self, credential: &Credential) -> Result<()> {
            storage()?
                .set_item(STORAGE_KEY, credential.as_str())
                .map_err(|e| anyhow!("writing {STORAGE_KEY}: {e:?}"))
        }

        fn clear(&self) -> Result<()> {
            storage()?
                .remove_item(STORAGE_KEY)
                .map_err(|e| anyhow!("removing {STORAGE_KEY}: {e:?}"))
        }
    }
}
