//! Archive downloads with SHA256 verification.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::unpack::ArchiveKind;
use crate::package::{PackageId, StageError};

const CHUNK_SIZE: usize = 64 * 1024;

/// Download `url` into `download_dir` as `file_name` and return the file's path.
///
/// An existing file is reused when it matches `expected_sha256`, or when no
/// hash is given. A fresh download is streamed into a temporary file and
/// verified before it replaces anything on disk, so a bad transfer never
/// leaves a file behind.
pub fn download(
  url: &str,
  file_name: &str,
  expected_sha256: Option<&str>,
  download_dir: &Path,
  dry_run: bool,
) -> Result<PathBuf, StageError> {
  let dest_path = download_dir.join(file_name);

  if dest_path.exists() {
    match expected_sha256 {
      None => {
        info!(path = %dest_path.display(), "using downloaded file");
        return Ok(dest_path);
      }
      Some(expected) => {
        debug!(path = %dest_path.display(), "checking cached file");
        let actual = hash_file(&dest_path)?;
        if actual.eq_ignore_ascii_case(expected) {
          info!(path = %dest_path.display(), "using cached file");
          return Ok(dest_path);
        }
        debug!(expected = %expected, actual = %actual, "cached file hash mismatch, re-downloading");
      }
    }
  }

  if dry_run {
    info!(url = %url, dest = %dest_path.display(), "[dry-run] download");
    return Ok(dest_path);
  }

  info!(url = %url, "downloading");
  fs::create_dir_all(download_dir)?;
  let mut file = NamedTempFile::new_in(download_dir)?;
  let (size, actual) = get(url, file_name, file.as_file_mut())?;

  if let Some(expected) = expected_sha256
    && !actual.eq_ignore_ascii_case(expected)
  {
    return Err(StageError::HashMismatch {
      url: url.to_string(),
      expected: expected.to_string(),
      actual,
    });
  }

  file.flush()?;
  file.persist(&dest_path).map_err(|e| e.error)?;

  info!(path = %dest_path.display(), size, sha256 = %actual, "download complete");
  Ok(dest_path)
}

/// Stream the body of `url` into `out`, returning its size and SHA256.
fn get(url: &str, label: &str, out: &mut impl Write) -> Result<(u64, String), StageError> {
  let fetch_failed = |message: String| StageError::FetchFailed {
    url: url.to_string(),
    message,
  };

  let mut response = reqwest::blocking::get(url).map_err(|e| fetch_failed(e.to_string()))?;
  if !response.status().is_success() {
    return Err(fetch_failed(format!("HTTP {}", response.status())));
  }

  let bar = download_bar(label, response.content_length());
  let mut hasher = Sha256::new();
  let mut buf = vec![0u8; CHUNK_SIZE];
  let mut size = 0u64;
  loop {
    let n = match response.read(&mut buf) {
      Ok(0) => break,
      Ok(n) => n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => {
        bar.abandon();
        return Err(fetch_failed(e.to_string()));
      }
    };
    hasher.update(&buf[..n]);
    out.write_all(&buf[..n])?;
    size += n as u64;
    bar.inc(n as u64);
  }
  bar.finish_and_clear();

  Ok((size, hex::encode(hasher.finalize())))
}

/// Progress bar on stderr, sized from the response's content length when the
/// server sends one. Hidden when stderr is not a terminal.
fn download_bar(label: &str, total: Option<u64>) -> ProgressBar {
  let bar = match total {
    Some(total) => {
      let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
      if let Ok(style) = ProgressStyle::with_template("  {prefix:<24} {bytes:>10}/{total_bytes:<10} [{bar:30.cyan/dim}]") {
        bar.set_style(style.progress_chars("━╸░"));
      }
      bar
    }
    None => {
      let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
      if let Ok(style) = ProgressStyle::with_template("  {spinner:.dim} {prefix:<24} {bytes:>10}") {
        bar.set_style(style);
      }
      bar
    }
  };
  bar.set_prefix(label.to_string());
  bar
}

/// File name for a package's downloaded archive.
///
/// Keyed on the package identity so that archives from different projects
/// sharing a URL basename (such as GitHub's `v1.0.tar.gz` tag archives) never
/// collide. The URL's archive extension is kept so the file can be unpacked.
pub fn archive_file_name(id: &PackageId, url: &str) -> String {
  let url_name = url_to_filename(url);
  let stem = sanitize(&id.to_string());
  match ArchiveKind::detect(Path::new(&url_name)) {
    Some(kind) => format!("{stem}{}", kind.extension()),
    None => format!("{stem}-{url_name}"),
  }
}

/// Lowercase hex SHA256 of a file's contents.
pub fn hash_file(path: &Path) -> io::Result<String> {
  let mut file = fs::File::open(path)?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher)?;
  Ok(hex::encode(hasher.finalize()))
}

/// File name for a downloaded URL: its last path component, sanitized.
/// Falls back to a hash of the URL when no usable name exists.
pub(crate) fn url_to_filename(url: &str) -> String {
  let last = url.rsplit('/').next().unwrap_or(url);
  let last = last.split(['?', '#']).next().unwrap_or(last);

  let sanitized = sanitize(last);
  if !sanitized.is_empty() && sanitized != "." && sanitized != ".." {
    return sanitized;
  }

  let digest = hex::encode(Sha256::digest(url.as_bytes()));
  format!("download_{}", &digest[..16])
}

fn sanitize(name: &str) -> String {
  name
    .chars()
    .map(|c| {
      if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
        c
      } else {
        '_'
      }
    })
    .collect()
}
