//! Side-effecting steps used by manifest recipes.
//!
//! Each step honours [`Context::is_dry_run`](crate::context::Context::is_dry_run):
//! in a dry run it logs what it would do and returns without touching the
//! network, the filesystem or any child process.

pub mod cmake;
pub mod cmd;
pub mod fetch;
pub mod unpack;

pub use cmd::{run_program, run_shell};
pub use fetch::{archive_file_name, download, hash_file};
pub use unpack::{ArchiveKind, unpack};
