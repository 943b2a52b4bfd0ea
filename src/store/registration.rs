use std::{
    io,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tracing::{debug, info};
use url::Url;

use crate::utils::clock::Clock;

use super::{entities::FileRecord, error::RegisterError};

/// Delay imitating the round trip of a real upload.
pub const DEFAULT_REGISTRATION_DELAY: Duration = Duration::from_millis(500);

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Simulated upload. Nothing leaves the machine: after a fixed delay the file is described by
/// its metadata and a `file://` reference used for previews.
pub struct FileRegistrar {
    delay: Duration,
    timeout: Option<Duration>,
    last_id: AtomicU64,
}

impl FileRegistrar {
    pub fn new(delay: Duration, timeout: Option<Duration>) -> Self {
        Self {
            delay,
            timeout,
            last_id: AtomicU64::new(0),
        }
    }

    pub async fn register(
        &self,
        clock: &dyn Clock,
        path: &Path,
    ) -> Result<FileRecord, RegisterError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.register_inner(clock, path))
                .await
                .map_err(|_| RegisterError::TimedOut(limit))?,
            None => self.register_inner(clock, path).await,
        }
    }

    async fn register_inner(
        &self,
        clock: &dyn Clock,
        path: &Path,
    ) -> Result<FileRecord, RegisterError> {
        let unreadable = |source| RegisterError::Unreadable {
            path: path.to_path_buf(),
            source,
        };
        let metadata = tokio::fs::metadata(path).await.map_err(unreadable)?;
        if !metadata.is_file() {
            return Err(RegisterError::NotAFile(path.to_path_buf()));
        }
        tokio::fs::File::open(path).await.map_err(unreadable)?;
        let absolute = tokio::fs::canonicalize(path).await.map_err(unreadable)?;
        let url = Url::from_file_path(&absolute).map_err(|_| {
            unreadable(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path can't be expressed as a file URL",
            ))
        })?;

        debug!("Registering {absolute:?}, {} bytes", metadata.len());
        clock.sleep(self.delay).await;

        let name = path
            .file_name()
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_default();

        let record = FileRecord {
            id: self.issue_id(clock.time().timestamp_millis().max(0) as u64).to_string(),
            mime_type: guess_mime_type(path).into(),
            size: metadata.len(),
            url: url.into(),
            name,
        };
        info!("Registered file {} as {}", record.name, record.id);
        Ok(record)
    }

    /// Time-derived ids, strictly increasing within one registrar.
    fn issue_id(&self, millis: u64) -> u64 {
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(u64::max(millis, last + 1))
            })
            .unwrap_or_else(|last| last);
        u64::max(millis, previous + 1)
    }
}

impl Default for FileRegistrar {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRATION_DELAY, None)
    }
}

fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|v| v.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        _ => FALLBACK_MIME_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, path::Path, time::Duration};

    use anyhow::Result;
    use tempfile::tempdir;
    use url::Url;

    use crate::{
        store::error::RegisterError,
        utils::clock::{DefaultClock, TestClock},
    };

    use super::{guess_mime_type, FileRegistrar, DEFAULT_REGISTRATION_DELAY};

    #[tokio::test(start_paused = true)]
    async fn test_register_waits_and_describes_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("Proof.PNG");
        std::fs::File::create(&path)?.write_all(&[0; 42])?;

        let registrar = FileRegistrar::default();
        let clock = TestClock::default();
        let started = tokio::time::Instant::now();
        let record = registrar.register(&clock, &path).await?;

        assert!(started.elapsed() >= DEFAULT_REGISTRATION_DELAY);
        assert_eq!(record.name, "Proof.PNG");
        assert_eq!(record.size, 42);
        assert_eq!(record.mime_type, "image/png");
        assert!(record.url.starts_with("file://"));
        assert!(record.url.ends_with("Proof.PNG"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_ids_are_unique() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "done")?;

        let registrar = FileRegistrar::new(Duration::ZERO, None);
        let clock = TestClock::default();
        let first = registrar.register(&clock, &path).await?;
        let second = registrar.register(&clock, &path).await?;
        assert_ne!(first.id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_missing_file() {
        let registrar = FileRegistrar::new(Duration::ZERO, None);
        let result = registrar
            .register(&DefaultClock, Path::new("/definitely/not/here.png"))
            .await;
        assert!(matches!(result, Err(RegisterError::Unreadable { .. })));
    }

    #[tokio::test]
    async fn test_register_url_is_encoded() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("proof #1.png");
        std::fs::write(&path, "x")?;

        let registrar = FileRegistrar::new(Duration::ZERO, None);
        let record = registrar.register(&DefaultClock, &path).await?;

        assert!(record.url.ends_with("/proof%20%231.png"));
        let parsed = Url::parse(&record.url)?;
        assert_eq!(parsed.scheme(), "file");
        assert_eq!(parsed.to_file_path().ok(), Some(std::fs::canonicalize(&path)?));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_register_file_without_read_access() -> Result<()> {
        use std::{fs::Permissions, os::unix::fs::PermissionsExt};

        let dir = tempdir()?;
        let path = dir.path().join("locked.txt");
        std::fs::write(&path, "secret")?;
        std::fs::set_permissions(&path, Permissions::from_mode(0o000))?;
        if std::fs::File::open(&path).is_ok() {
            // Privileged users ignore permission bits.
            return Ok(());
        }

        let registrar = FileRegistrar::new(Duration::ZERO, None);
        let result = registrar.register(&DefaultClock, &path).await;
        assert!(matches!(result, Err(RegisterError::Unreadable { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_directory() -> Result<()> {
        let dir = tempdir()?;
        let registrar = FileRegistrar::new(Duration::ZERO, None);
        let result = registrar.register(&DefaultClock, dir.path()).await;
        assert!(matches!(result, Err(RegisterError::NotAFile(_))));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_timeout() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("slow.bin");
        std::fs::write(&path, "x")?;

        let registrar =
            FileRegistrar::new(Duration::from_secs(10), Some(Duration::from_secs(1)));
        let result = registrar.register(&TestClock::default(), &path).await;
        assert!(matches!(result, Err(RegisterError::TimedOut(_))));
        Ok(())
    }

    #[test]
    fn test_mime_fallback() {
        assert_eq!(guess_mime_type(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(guess_mime_type(Path::new("archive.tar.zst")), "application/octet-stream");
        assert_eq!(guess_mime_type(Path::new("README")), "application/octet-stream");
    }
}
