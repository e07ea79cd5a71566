//! nestpkg-lib: dependency resolution for native libraries
//!
//! This crate provides the pieces behind the `nestpkg` command:
//! - `Package`: a named, versioned unit with fetch, build and install stages
//! - `PackageCollection`: requests gathered from a manifest tree, with depths
//!   and pending sub-manifest references
//! - `resolve`: expansion, deduplication, ordering and execution
//! - `manifest`: the TOML manifest format and its loader
//! - `Context`: the read-only build environment passed to every stage

pub mod actions;
pub mod consts;
pub mod context;
pub mod deps_lock;
pub mod manifest;
pub mod package;
pub mod placeholder;
pub mod resolve;
pub mod toolchain;
