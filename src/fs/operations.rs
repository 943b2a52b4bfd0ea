use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

/// Opens the lock file guarding a directory of documents. The lock file itself is never
/// written to, it only carries the advisory lock.
async fn open_lock(lock_path: &Path) -> Result<File, io::Error> {
    File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .await
}

/// Reads the whole file under a shared lock. A missing file is reported as `None`.
pub async fn read_locked(path: &Path, lock_path: &Path) -> Result<Option<String>, io::Error> {
    let lock = open_lock(lock_path).await?;
    lock.lock_shared()?;

    async fn read(path: &Path) -> Result<Option<String>, io::Error> {
        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;
        Ok(Some(contents))
    }

    let result = read(path).await;

    lock.unlock_async().await?;
    result
}

/// Replaces the file with `contents`. Data goes into a sibling temporary file first and is then
/// renamed over the target, so readers see either the old or the new document.
pub async fn write_atomically(
    path: &Path,
    lock_path: &Path,
    contents: &[u8],
) -> Result<(), io::Error> {
    let lock = open_lock(lock_path).await?;
    lock.lock_exclusive()?;

    async fn write(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
        let temporary = temporary_path(path);
        debug!("Writing {} bytes through {temporary:?}", contents.len());
        let mut file = File::create(&temporary).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temporary, path).await
    }

    let result = write(path, contents).await;

    lock.unlock_async().await?;
    result
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
