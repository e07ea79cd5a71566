//! Compiler flag defaults per operating system and build type.
//!
//! These are the values handed to CMake configure steps when the
//! configuration does not override them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::ConfigError;

/// Host operating system, as far as flag selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
  Other,
}

impl Os {
  pub fn current() -> Self {
    if cfg!(target_os = "linux") {
      Os::Linux
    } else if cfg!(target_os = "macos") {
      Os::MacOs
    } else if cfg!(windows) {
      Os::Windows
    } else {
      Os::Other
    }
  }

  pub fn is_windows(self) -> bool {
    self == Os::Windows
  }
}

/// CMake build type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildType {
  Debug,
  #[default]
  Release,
  RelWithDebInfo,
  MinSizeRel,
}

impl BuildType {
  pub fn as_str(self) -> &'static str {
    match self {
      BuildType::Debug => "Debug",
      BuildType::Release => "Release",
      BuildType::RelWithDebInfo => "RelWithDebInfo",
      BuildType::MinSizeRel => "MinSizeRel",
    }
  }

  pub fn is_debug(self) -> bool {
    self == BuildType::Debug
  }

  /// Value for `CMAKE_MSVC_RUNTIME_LIBRARY` (static runtime).
  pub fn msvc_runtime(self) -> &'static str {
    if self.is_debug() {
      "MultiThreadedDebug"
    } else {
      "MultiThreaded"
    }
  }
}

impl fmt::Display for BuildType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BuildType {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "debug" => Ok(BuildType::Debug),
      "release" => Ok(BuildType::Release),
      "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
      "minsizerel" => Ok(BuildType::MinSizeRel),
      _ => Err(ConfigError::UnknownBuildType(s.to_string())),
    }
  }
}

/// C, C++ and linker flags for one configure step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerFlags {
  pub cflags: String,
  pub cxxflags: String,
  pub ldflags: String,
}

impl CompilerFlags {
  fn same(compile: &str, link: &str) -> Self {
    Self {
      cflags: compile.to_string(),
      cxxflags: compile.to_string(),
      ldflags: link.to_string(),
    }
  }
}

const GNU_DEBUG: &str = "-fdata-sections -ffunction-sections -fno-omit-frame-pointer -g";
const GNU_RELEASE: &str =
  "-fdata-sections -ffunction-sections -fno-omit-frame-pointer -g -Wno-error=deprecated-declarations";
const MSVC_DEBUG: &str = "/MP /utf-8 /EHsc";
const MSVC_RELEASE: &str = "/MP /utf-8 /Gy /EHsc";
const MSVC_LINK: &str = "/OPT:REF /INCREMENTAL:NO";

/// Default flags for `os` and `build_type`.
pub fn default_flags(os: Os, build_type: BuildType) -> CompilerFlags {
  let debug = build_type.is_debug();
  match os {
    Os::Linux => CompilerFlags::same(if debug { GNU_DEBUG } else { GNU_RELEASE }, "-Wl,--gc-sections"),
    Os::MacOs => CompilerFlags::same(if debug { GNU_DEBUG } else { GNU_RELEASE }, "-Wl,-dead_strip"),
    Os::Windows => CompilerFlags::same(if debug { MSVC_DEBUG } else { MSVC_RELEASE }, MSVC_LINK),
    Os::Other => CompilerFlags::default(),
  }
}
