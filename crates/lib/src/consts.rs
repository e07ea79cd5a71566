/// Application name, used in log targets and lock metadata.
pub const APP_NAME: &str = "nestpkg";

/// File name looked up when a manifest reference names a directory.
pub const MANIFEST_FILENAME: &str = "nestpkg.toml";

/// Lock file created inside the deps directory while resolving.
pub const LOCK_FILENAME: &str = ".lock";
