//! Terminal and JSON rendering for command results.
//!
//! Status lines carry a colored marker when the stream supports it. Human
//! summaries go to stdout and problems to stderr, next to the tracing logs;
//! with `--output json` stdout holds nothing but the JSON document.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Leader for list items (packages, sub-manifest references).
pub const ITEM: &str = "•";
/// Leader for packages in build order.
pub const STEP: &str = "→";

#[derive(Clone, Copy)]
enum Status {
  Done,
  Failed,
  Caution,
  Note,
}

impl Status {
  fn marker(self) -> &'static str {
    match self {
      Status::Done => "✓",
      Status::Failed => "✗",
      Status::Caution => "⚠",
      Status::Note => ITEM,
    }
  }

  fn print(self, message: &str) {
    let marker = self.marker();
    match self {
      Status::Done => println!("{} {message}", marker.if_supports_color(Stream::Stdout, |s| s.green())),
      Status::Note => println!("{} {message}", marker.if_supports_color(Stream::Stdout, |s| s.blue())),
      Status::Failed => eprintln!(
        "{} {}",
        marker.if_supports_color(Stream::Stderr, |s| s.red()),
        message.if_supports_color(Stream::Stderr, |s| s.red())
      ),
      Status::Caution => eprintln!(
        "{} {}",
        marker.if_supports_color(Stream::Stderr, |s| s.yellow()),
        message.if_supports_color(Stream::Stderr, |s| s.yellow())
      ),
    }
  }
}

/// Elapsed time as `850ms`, `4.20s` or `3m 07s`.
pub fn format_duration(duration: Duration) -> String {
  let millis = duration.as_millis();
  match millis {
    0..1_000 => format!("{millis}ms"),
    1_000..60_000 => format!("{}.{:02}s", millis / 1_000, (millis % 1_000) / 10),
    _ => format!("{}m {:02}s", millis / 60_000, (millis % 60_000) / 1_000),
  }
}

/// An error and its causes on one line. Causes whose text already appears
/// (library errors embed their source) are skipped.
pub fn format_error(err: &anyhow::Error) -> String {
  let mut out = err.to_string();
  for cause in err.chain().skip(1) {
    let message = cause.to_string();
    if !out.contains(&message) {
      out.push_str(": ");
      out.push_str(&message);
    }
  }
  out
}

pub fn print_success(message: &str) {
  Status::Done.print(message);
}

pub fn print_error(message: &str) {
  Status::Failed.print(message);
}

pub fn print_warning(message: &str) {
  Status::Caution.print(message);
}

pub fn print_info(message: &str) {
  Status::Note.print(message);
}

/// An indented `label: value` line.
pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()));
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("serializing output to JSON")?;
  println!("{json}");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn durations_pick_a_readable_unit() {
    assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
    assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    assert_eq!(format_duration(Duration::from_secs(65)), "1m 05s");
    assert_eq!(format_duration(Duration::from_secs(600)), "10m 00s");
  }

  #[test]
  fn format_error_skips_repeated_causes() {
    let io = std::io::Error::other("disk full");
    let embedded = anyhow::Error::msg(format!("write failed: {io}")).context("install zlib");
    assert_eq!(format_error(&embedded), "install zlib: write failed: disk full");

    let chained = anyhow::Error::new(std::io::Error::other("disk full")).context("install zlib");
    assert_eq!(format_error(&chained), "install zlib: disk full");
  }
}
