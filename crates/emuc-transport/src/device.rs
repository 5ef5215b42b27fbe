use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, TransportError};

/// An open adapter device. Implements `Read` and `Write`.
///
/// Any path that can be opened read/write works: a tty, a pseudo-terminal,
/// a FIFO, or a plain file holding a captured session.
pub struct SerialDevice {
    inner: File,
    path: PathBuf,
}

impl SerialDevice {
    /// Open the device node for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "opened adapter device");
        Ok(Self { inner, path })
    }

    /// Open the device read-only (capture replay, monitoring).
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = File::open(&path).map_err(|source| TransportError::Open {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "opened adapter device read-only");
        Ok(Self { inner, path })
    }

    /// Try to clone this handle (duplicates the file descriptor).
    ///
    /// Used to give the reader and the writer their own handle.
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            path: self.path.clone(),
        })
    }

    /// Path the device was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for SerialDevice {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SerialDevice {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for SerialDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialDevice")
            .field("path", &self.path)
            .finish()
    }
}

/// Open the device for use with tokio I/O.
#[cfg(feature = "async")]
pub async fn open_async(path: impl AsRef<Path>) -> Result<tokio::fs::File> {
    let path = path.as_ref().to_path_buf();
    let file = tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .await
        .map_err(|source| TransportError::Open {
            path: path.clone(),
            source,
        })?;

    tracing::debug!(path = %path.display(), "opened adapter device (async)");
    Ok(file)
}
