use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hyauth_core::entities::SessionRecord;
use hyauth_core::ports::SessionStore;
use hyauth_core::Error;
use tokio::fs;
use tracing::{debug, instrument};

/// Keeps the last opened game session as JSON next to the config file
pub struct FileSessionStore {
    store_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            store_path: config_dir.join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.store_path
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), Error> {
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    #[instrument(skip(self, record), fields(owner = %record.owner))]
    async fn save(&self, record: &SessionRecord) -> Result<(), Error> {
        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| Error::Other(format!("failed to serialize session: {}", e)))?;
        fs::write(&self.store_path, content).await?;
        restrict_permissions(&self.store_path).await?;

        debug!(path = %self.store_path.display(), "session saved");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load(&self) -> Result<Option<SessionRecord>, Error> {
        if !fs::try_exists(&self.store_path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.store_path).await?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Other(format!("failed to parse session file: {}", e)))
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.store_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
