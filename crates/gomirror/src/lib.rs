//! # Gomirror
//!
//! Builds a "virtual" GOPATH: discovers the modules visible to a Go
//! workspace, arranges their import paths into a segment forest, and
//! projects that forest onto a destination directory with symbolic links
//! so GOPATH-based tooling can operate against a module-based checkout
//! without copying files.
//!
//! ## Features
//!
//! - **Listing**: wraps `go list -m -json all` (or any substitute
//!   producer) as a stream with bounded-time shutdown
//! - **Decoding**: back-to-back JSON records into [`Module`] values
//! - **Filtering**: drops modules that cannot be mirrored
//! - **Forest building**: import paths split on `/` into [`Node`] trees
//! - **Projection**: leaf modules become single symlinks, branches become
//!   directories of per-entry symlinks
//! - **Aux links**: `bin` and `pkg` mirrored from `$GOBIN`/GOPATH

pub mod gopath;
pub mod link;
pub mod module;
pub mod tree;

pub use gopath::{go_bin_dir, gopath, GopathError};
pub use link::{
    link_go_bin, link_go_pkg, link_go_src, link_go_src_with, link_nodes, mirror, mirror_with,
    LinkError, MirrorError, Options, SrcError,
};
pub use module::{
    decode_modules, filter_modules, GoList, Module, ModuleError, ModuleStream,
    DEFAULT_GRACE_PERIOD,
};
pub use tree::{build_nodes, Node, TreeError};
