//! Exclusive lock on a deps directory.
//!
//! Two runs sharing a deps directory would race on downloads, unpacked
//! sources and the install prefix. The resolving run holds an advisory lock on
//! `<deps_dir>/.lock` for its whole lifetime; the lock file records who holds
//! it so a blocked run can say why.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::LOCK_FILENAME;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub deps_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum DepsLockError {
  #[error(
    "deps directory is locked by another process: {command} (PID {pid}, started at unix time {started_at_unix})\n\
     If you're sure no nestpkg process is running, remove the lock file:\n  {}",
    lock_path.display()
  )]
  Contention {
    command: String,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  #[error(
    "deps directory is locked (could not read lock metadata)\n\
     If you're sure no nestpkg process is running, remove the lock file:\n  {}",
    lock_path.display()
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("failed to create deps directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to open lock file: {0}")]
  OpenFile(#[source] io::Error),

  #[error("failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("failed to acquire lock: {0}")]
  LockFailed(#[source] io::Error),
}

/// Held lock; released when dropped.
#[derive(Debug)]
pub struct DepsLock {
  file: File,
  lock_path: PathBuf,
}

impl DepsLock {
  /// Take the lock on `deps_dir`, creating the directory if needed.
  /// Fails immediately if another process holds it.
  pub fn acquire(deps_dir: &Path, command: &str) -> Result<Self, DepsLockError> {
    std::fs::create_dir_all(deps_dir).map_err(DepsLockError::CreateDir)?;
    let lock_path = deps_dir.join(LOCK_FILENAME);

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(DepsLockError::OpenFile)?;

    if let Err(err) = try_lock_exclusive(&file) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(read_contention_error(&lock_path));
      }
      return Err(DepsLockError::LockFailed(err));
    }

    write_metadata(&file, command, deps_dir)?;
    debug!(path = %lock_path.display(), "deps lock acquired");

    Ok(Self { file, lock_path })
  }

  /// Metadata as written by this holder. Reads through the held handle, since
  /// Windows refuses a second handle on a locked region.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

fn write_metadata(file: &File, command: &str, deps_dir: &Path) -> Result<(), DepsLockError> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    command: command.to_string(),
    deps_dir: deps_dir.to_path_buf(),
  };

  file.set_len(0).map_err(DepsLockError::WriteMetadata)?;
  let mut writer = io::BufWriter::new(file);
  writer.seek(SeekFrom::Start(0)).map_err(DepsLockError::WriteMetadata)?;
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(|e| DepsLockError::WriteMetadata(io::Error::other(e)))?;
  writer.flush().map_err(DepsLockError::WriteMetadata)?;
  Ok(())
}

fn read_contention_error(lock_path: &Path) -> DepsLockError {
  if let Ok(contents) = std::fs::read_to_string(lock_path)
    && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
  {
    return DepsLockError::Contention {
      command: metadata.command,
      pid: metadata.pid,
      started_at_unix: metadata.started_at_unix,
      lock_path: lock_path.to_path_buf(),
    };
  }

  DepsLockError::ContentionUnknown {
    lock_path: lock_path.to_path_buf(),
  }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, HANDLE};
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is plain data and valid when zeroed; the handle is
  // owned by `file` and open for the duration of the call.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if result != 0 {
    return Ok(());
  }
  let err = io::Error::last_os_error();
  if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) {
    return Err(io::Error::from(io::ErrorKind::WouldBlock));
  }
  Err(err)
}
