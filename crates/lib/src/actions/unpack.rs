//! Source archive extraction.
//!
//! Archives are unpacked with their own top-level directory intact, so a
//! tarball of `zlib-1.3.1/` lands at `<dest>/zlib-1.3.1/`.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::info;

use crate::package::StageError;

/// Supported archive formats, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
  TarGz,
  Tar,
  Zip,
}

impl ArchiveKind {
  pub fn detect(path: &Path) -> Option<Self> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
      Some(Self::TarGz)
    } else if name.ends_with(".tar") {
      Some(Self::Tar)
    } else if name.ends_with(".zip") {
      Some(Self::Zip)
    } else {
      None
    }
  }

  /// Canonical file extension, including the leading dot.
  pub fn extension(self) -> &'static str {
    match self {
      Self::TarGz => ".tar.gz",
      Self::Tar => ".tar",
      Self::Zip => ".zip",
    }
  }
}

/// Unpack `archive` into `dest`, creating `dest` if needed.
pub fn unpack(archive: &Path, dest: &Path, dry_run: bool) -> Result<(), StageError> {
  let kind = ArchiveKind::detect(archive).ok_or_else(|| StageError::Archive {
    path: archive.to_path_buf(),
    message: "unsupported archive format (expected .tar.gz, .tgz, .tar or .zip)".to_string(),
  })?;

  if dry_run {
    info!(archive = %archive.display(), dest = %dest.display(), "[dry-run] unpack");
    return Ok(());
  }

  fs::create_dir_all(dest)?;
  let to_archive_error = |e: io::Error| StageError::Archive {
    path: archive.to_path_buf(),
    message: e.to_string(),
  };

  match kind {
    ArchiveKind::TarGz => {
      let decoder = GzDecoder::new(BufReader::new(File::open(archive)?));
      Archive::new(decoder).unpack(dest).map_err(to_archive_error)?;
    }
    ArchiveKind::Tar => {
      let reader = BufReader::new(File::open(archive)?);
      Archive::new(reader).unpack(dest).map_err(to_archive_error)?;
    }
    ArchiveKind::Zip => unpack_zip(archive, dest)?,
  }

  info!(archive = %archive.display(), dest = %dest.display(), "unpacked");
  Ok(())
}

fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<(), StageError> {
  let archive_error = |message: String| StageError::Archive {
    path: archive_path.to_path_buf(),
    message,
  };

  let file = File::open(archive_path)?;
  let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| archive_error(e.to_string()))?;

  for i in 0..archive.len() {
    let mut entry = archive.by_index(i).map_err(|e| archive_error(e.to_string()))?;
    let Some(relative) = entry.enclosed_name() else {
      return Err(archive_error(format!("unsafe entry name '{}'", entry.name())));
    };
    let dest_path = dest.join(relative);

    if entry.is_dir() {
      fs::create_dir_all(&dest_path)?;
      continue;
    }
    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent)?;
    }
    let mut out = File::create(&dest_path)?;
    io::copy(&mut entry, &mut out)?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      if let Some(mode) = entry.unix_mode() {
        fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
      }
    }
  }

  Ok(())
}
